use super::{follow_pending, PageChrome};
use crate::controllers::{UploadStatus, UploadView};
use crate::routes::Route;
use crate::services::document_client::UploadFile;
use crate::session::Browser;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use docuserve_core::error::AppError;

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadTemplate {
    pub chrome: PageChrome,
    pub view: UploadView,
    pub max_file_size_mb: u64,
    /// Seconds before the page reloads, or `None` when nothing is pending.
    pub refresh_secs: Option<u64>,
}

/// How often the page reloads while an upload is running.
const UPLOADING_REFRESH_SECS: u64 = 1;

pub async fn upload_page(State(state): State<AppState>, browser: Browser) -> Response {
    if let Some(redirect) = follow_pending(&browser.session, Route::Upload) {
        return redirect.into_response();
    }

    let settings = &state.settings.upload;
    let view = browser.session.upload.snapshot();
    let refresh_secs = match view.status {
        UploadStatus::Uploading => Some(UPLOADING_REFRESH_SECS),
        UploadStatus::Success => Some(settings.redirect_delay_ms.div_ceil(1000).max(1)),
        UploadStatus::Idle | UploadStatus::Error => None,
    };

    UploadTemplate {
        view,
        chrome: PageChrome::for_browser(&browser, Route::Upload).await,
        max_file_size_mb: settings.max_file_size_bytes / (1024 * 1024),
        refresh_secs,
    }
    .into_response()
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(anyhow::anyhow!(e.body_text()))
    }
}

/// Read the `file` field, if the form carried one with a name.
async fn read_file(multipart: &mut Multipart) -> Result<Option<UploadFile>, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(multipart_error)?;

        if name.is_empty() {
            return Ok(None);
        }
        return Ok(Some(UploadFile::new(name, mime_type, data.to_vec())));
    }
    Ok(None)
}

/// Select the posted file and, when it is accepted, start sending it. The
/// redirect does not wait for the backend.
pub async fn upload_handler(
    browser: Browser,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let upload = &browser.session.upload;

    match read_file(&mut multipart).await? {
        Some(file) => {
            if upload.select_file(file) && !upload.start() {
                tracing::debug!("Nothing to upload");
            }
        }
        None => tracing::debug!("Upload form posted without a file"),
    }

    Ok(Redirect::to(&Route::Upload.path()))
}

pub async fn retry_upload_handler(browser: Browser) -> Redirect {
    if !browser.session.upload.start() {
        tracing::debug!("Retry ignored; nothing to upload");
    }
    Redirect::to(&Route::Upload.path())
}

pub async fn cancel_upload_handler(browser: Browser) -> Redirect {
    if !browser.session.upload.cancel() {
        tracing::debug!("Cancel ignored while uploading");
    }
    Redirect::to(&Route::Upload.path())
}
