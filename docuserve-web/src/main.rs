use docuserve_core::observability::init_tracing;
use docuserve_web::config::get_configuration;
use docuserve_web::services::document_client::DocumentClient;
use docuserve_web::services::metrics::init_metrics;
use docuserve_web::services::user_client::UserClient;
use docuserve_web::startup::{build_router, FIRST_VISIT_IDLE_MINUTES, SESSION_INACTIVITY_DAYS};
use docuserve_web::AppState;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const EVICTION_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "docuserve-web",
        &configuration.telemetry.log_level,
        configuration.telemetry.otlp_endpoint.as_deref(),
    )?;

    init_metrics().map_err(|e| anyhow::anyhow!("Failed to register metrics: {}", e))?;

    let api = Arc::new(DocumentClient::new(&configuration.api)?);
    let users = Arc::new(UserClient::new(&configuration.api)?);
    info!(base_url = %configuration.api.base_url, "Using DocuServe API");

    let address = format!(
        "{}:{}",
        configuration.server.host, configuration.server.port
    );
    let state = AppState::new(api, users, configuration);

    let browsers = state.browsers.clone();
    tokio::spawn(async move {
        let max_idle = Duration::from_secs(SESSION_INACTIVITY_DAYS as u64 * 24 * 60 * 60);
        let first_visit_idle = Duration::from_secs(FIRST_VISIT_IDLE_MINUTES * 60);
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            browsers.evict_idle(max_idle, first_visit_idle);
        }
    });

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&address).await.map_err(|e| {
        tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
        anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
    })?;

    info!("Starting docuserve-web on {}", address);
    axum::serve(listener, app).await.map_err(|e| {
        tracing::error!("Server error: {}", e);
        anyhow::anyhow!("Server error: {}", e)
    })?;

    Ok(())
}
