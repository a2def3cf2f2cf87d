use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    #[serde(default)]
    pub upload: UploadSettings,
    #[serde(default)]
    pub viewer: ViewerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Origin of the DocuServe backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Transport timeout for every call to the backend.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Deserialize, Clone, Debug)]
pub struct UploadSettings {
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Pause on the success state before returning to the document list.
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_redirect_delay_ms() -> u64 {
    1500
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            redirect_delay_ms: default_redirect_delay_ms(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct ViewerSettings {
    /// Names ending in one of these are previewed inline as plain text.
    #[serde(default = "default_text_extensions")]
    pub text_extensions: Vec<String>,
}

fn default_text_extensions() -> Vec<String> {
    vec![".txt".to_string()]
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            text_extensions: default_text_extensions(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP/gRPC collector endpoint; span export is disabled when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("Failed to read current dir: {}", e)))?;

    // Allow running from the workspace root or from inside the crate.
    let configuration_directory = if base_path.ends_with("docuserve-web") {
        base_path.join("config")
    } else {
        base_path.join("docuserve-web").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let settings: Settings = config::Config::builder()
            .set_override("server.host", "127.0.0.1")
            .unwrap()
            .set_override("server.port", 3000)
            .unwrap()
            .set_override("api.base_url", "http://localhost:8000")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.api.timeout_secs, 30);
        assert_eq!(settings.upload.max_file_size_bytes, 10_485_760);
        assert_eq!(settings.upload.redirect_delay_ms, 1500);
        assert_eq!(settings.viewer.text_extensions, vec![".txt".to_string()]);
        assert_eq!(settings.telemetry.log_level, "info");
        assert!(settings.telemetry.otlp_endpoint.is_none());
    }
}
