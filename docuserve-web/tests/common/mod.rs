#![allow(dead_code)]

use docuserve_web::config::{
    ApiSettings, ServerSettings, Settings, TelemetrySettings, UploadSettings, ViewerSettings,
};
use docuserve_web::services::document_client::DocumentApi;
use docuserve_web::startup::build_router;
use docuserve_web::testing::{FakeDocumentApi, FakeUserApi};
use docuserve_web::AppState;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Short enough for tests to wait out the post-upload pause.
pub const TEST_REDIRECT_DELAY_MS: u64 = 300;

pub fn test_settings(base_url: &str) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        api: ApiSettings {
            base_url: base_url.to_string(),
            timeout_secs: 5,
        },
        upload: UploadSettings {
            redirect_delay_ms: TEST_REDIRECT_DELAY_MS,
            ..UploadSettings::default()
        },
        viewer: ViewerSettings::default(),
        telemetry: TelemetrySettings::default(),
    }
}

pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub api: Arc<FakeDocumentApi>,
    pub users: Arc<FakeUserApi>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeDocumentApi::new()).await
    }

    pub async fn spawn_with(api: FakeDocumentApi) -> Self {
        let api = Arc::new(api);
        let users = Arc::new(FakeUserApi::new());
        let address = serve(api.clone(), users.clone()).await;

        Self {
            address,
            client: browser(),
            api,
            users,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn get_html(&self, path: &str) -> (String, String) {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request");
        assert!(response.status().is_success(), "GET {} -> {}", path, response.status());
        let final_path = response.url().path().to_string();
        (final_path, response.text().await.expect("Failed to read body"))
    }

    pub async fn post(&self, path: &str) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn upload(&self, name: &str, mime: &str, data: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(name.to_string())
            .mime_str(mime)
            .expect("Invalid mime type");
        let form = reqwest::multipart::Form::new().part("file", part);

        self.client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Reload the upload page until the running upload has finished.
    pub async fn settled_upload_page(&self) -> String {
        for _ in 0..200 {
            let (_, body) = self.get_html("/upload").await;
            if !body.contains("Uploading...") {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Upload did not finish");
    }

    /// Let the post-upload pause elapse.
    pub async fn wait_for_redirect(&self) {
        tokio::time::sleep(Duration::from_millis(TEST_REDIRECT_DELAY_MS * 2)).await;
    }
}

/// A client that keeps its session cookie, like a browser tab.
pub fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

async fn serve(api: Arc<dyn DocumentApi>, users: Arc<FakeUserApi>) -> String {
    let state = AppState::new(api, users, test_settings("http://127.0.0.1:9"));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().expect("No local address").port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server error");
    });

    format!("http://127.0.0.1:{}", port)
}
