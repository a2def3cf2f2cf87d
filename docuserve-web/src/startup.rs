use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use docuserve_core::middleware::{request_id_middleware, REQUEST_ID_HEADER};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    documents::{
        cancel_delete_handler, confirm_delete_handler, list_documents_page, request_delete_handler,
    },
    metrics::{http_metrics_middleware, metrics},
    notices::dismiss_notice_handler,
    preferences::toggle_auto_spell_check_handler,
    upload::{cancel_upload_handler, retry_upload_handler, upload_handler, upload_page},
    viewer::view_document_page,
};
use crate::AppState;

/// Browsers keep their identity for this long after their last request.
pub const SESSION_INACTIVITY_DAYS: i64 = 30;
/// Browsers that never return with their cookie are forgotten sooner.
pub const FIRST_VISIT_IDLE_MINUTES: u64 = 15;

/// Room for the multipart framing around a file at the size limit, so that
/// files just over it still reach the controller and get a proper message.
fn body_limit(max_file_size: u64) -> usize {
    usize::try_from(max_file_size.saturating_mul(2).saturating_add(1024 * 1024))
        .unwrap_or(usize::MAX)
}

pub fn build_router(state: AppState) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_INACTIVITY_DAYS)));

    let max_body = body_limit(state.settings.upload.max_file_size_bytes);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/documents", get(list_documents_page))
        .route("/documents/:id", get(view_document_page))
        .route("/documents/:id/delete", post(request_delete_handler))
        .route("/documents/confirm-delete", post(confirm_delete_handler))
        .route("/documents/cancel-delete", post(cancel_delete_handler))
        .route("/upload", get(upload_page).post(upload_handler))
        .route("/upload/retry", post(retry_upload_handler))
        .route("/upload/cancel", post(cancel_upload_handler))
        .route("/notices/:id/dismiss", post(dismiss_notice_handler))
        .route(
            "/preferences/auto-spell-check",
            post(toggle_auto_spell_check_handler),
        )
        .route_layer(from_fn(http_metrics_middleware))
        .layer(DefaultBodyLimit::max(max_body))
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
