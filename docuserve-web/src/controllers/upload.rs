//! Upload flow: pick a file, send it with progress, then return to the list.
//!
//! ```text
//! idle --select--> idle(file) --submit--> uploading --ok--> success --delay--> /documents
//!                                            |
//!                                            +--err--> error --submit--> uploading
//! ```
//!
//! Cancel is accepted in every state except `uploading` and returns to an
//! empty `idle`.

use crate::config::UploadSettings;
use crate::models::Document;
use crate::routes::{Navigator, Route};
use crate::services::document_client::{DocumentApi, ProgressCallback, UploadFile};
use crate::services::identity::IdentityProvider;
use crate::services::notifier::Notifier;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

pub const FILE_TOO_LARGE_MESSAGE: &str = "File size exceeds 10MB limit.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Upload failed. Please try again.";
pub const UPLOAD_SUCCEEDED_MESSAGE: &str = "Document uploaded successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

impl UploadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadStatus::Idle => "idle",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Success => "success",
            UploadStatus::Error => "error",
        }
    }
}

/// Metadata of the selected file, without its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
}

impl FileSummary {
    pub fn size_mb(&self) -> String {
        format!("{:.2}", self.size as f64 / 1024.0 / 1024.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadView {
    pub status: UploadStatus,
    pub file: Option<FileSummary>,
    pub progress: u8,
    pub error_message: Option<String>,
    pub uploaded: Option<Document>,
}

impl UploadView {
    pub fn can_submit(&self) -> bool {
        self.file.is_some() && !matches!(self.status, UploadStatus::Uploading | UploadStatus::Success)
    }

    pub fn can_cancel(&self) -> bool {
        self.status != UploadStatus::Uploading
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No file selected, or an upload is already running.
    NotReady,
    Uploaded(Document),
    Failed(String),
}

#[derive(Default)]
struct UploadState {
    file: Option<UploadFile>,
    status: UploadStatus,
    error_message: Option<String>,
    uploaded: Option<Document>,
    /// Bumped on every selection change so a late redirect only clears the
    /// selection it was scheduled for.
    epoch: u64,
}

#[derive(Clone)]
pub struct UploadController {
    api: Arc<dyn DocumentApi>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    identity: Arc<dyn IdentityProvider>,
    max_file_size: u64,
    redirect_delay: Duration,
    state: Arc<Mutex<UploadState>>,
    progress: Arc<watch::Sender<u8>>,
}

fn lock(state: &Mutex<UploadState>) -> MutexGuard<'_, UploadState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl UploadController {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        identity: Arc<dyn IdentityProvider>,
        settings: &UploadSettings,
    ) -> Self {
        let (progress, _) = watch::channel(0);
        Self {
            api,
            notifier,
            navigator,
            identity,
            max_file_size: settings.max_file_size_bytes,
            redirect_delay: Duration::from_millis(settings.redirect_delay_ms),
            state: Arc::new(Mutex::new(UploadState::default())),
            progress: Arc::new(progress),
        }
    }

    pub fn snapshot(&self) -> UploadView {
        let state = lock(&self.state);
        UploadView {
            status: state.status,
            file: state.file.as_ref().map(|f| FileSummary {
                name: f.name.clone(),
                size: f.size(),
                mime_type: f.mime_type.clone(),
            }),
            progress: *self.progress.borrow(),
            error_message: state.error_message.clone(),
            uploaded: state.uploaded.clone(),
        }
    }

    pub fn status(&self) -> UploadStatus {
        lock(&self.state).status
    }

    pub fn progress(&self) -> u8 {
        *self.progress.borrow()
    }

    /// Accept a picked or dropped file. Oversized files are rejected locally.
    ///
    /// Returns whether the file was accepted.
    pub fn select_file(&self, file: UploadFile) -> bool {
        let mut state = lock(&self.state);
        if state.status == UploadStatus::Uploading {
            tracing::debug!(file_name = %file.name, "Upload in progress; ignoring selection");
            return false;
        }

        state.epoch += 1;
        state.uploaded = None;
        self.progress.send_replace(0);

        if file.size() > self.max_file_size {
            tracing::info!(
                file_name = %file.name,
                size = file.size(),
                limit = self.max_file_size,
                "Rejected oversized file"
            );
            state.file = None;
            state.status = UploadStatus::Error;
            state.error_message = Some(FILE_TOO_LARGE_MESSAGE.to_string());
            return false;
        }

        tracing::debug!(file_name = %file.name, size = file.size(), "File selected");
        state.file = Some(file);
        state.status = UploadStatus::Idle;
        state.error_message = None;
        true
    }

    /// Discard the selection. Ignored while uploading.
    pub fn cancel(&self) -> bool {
        let mut state = lock(&self.state);
        if state.status == UploadStatus::Uploading {
            return false;
        }
        let epoch = state.epoch + 1;
        *state = UploadState {
            epoch,
            ..UploadState::default()
        };
        self.progress.send_replace(0);
        true
    }

    pub async fn submit(&self) -> SubmitOutcome {
        match self.begin() {
            Some((file, epoch)) => self.send(file, epoch).await,
            None => SubmitOutcome::NotReady,
        }
    }

    /// Move to `uploading` now and send the file on a background task, so
    /// pages rendered meanwhile see the upload and its progress.
    ///
    /// Returns whether an upload was started.
    pub fn start(&self) -> bool {
        let Some((file, epoch)) = self.begin() else {
            return false;
        };
        let controller = self.clone();
        tokio::spawn(async move {
            controller.send(file, epoch).await;
        });
        true
    }

    /// Claim the selected file for sending. `None` when there is nothing to
    /// send or an upload already ran.
    fn begin(&self) -> Option<(UploadFile, u64)> {
        let claimed = {
            let mut state = lock(&self.state);
            if matches!(state.status, UploadStatus::Uploading | UploadStatus::Success) {
                return None;
            }
            let file = state.file.clone()?;
            state.status = UploadStatus::Uploading;
            state.error_message = None;
            (file, state.epoch)
        };
        self.progress.send_replace(0);
        Some(claimed)
    }

    async fn send(&self, file: UploadFile, epoch: u64) -> SubmitOutcome {
        let user_id = match self.identity.get_or_create_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "Uploading without identity token");
                None
            }
        };

        let progress = self.progress.clone();
        let on_progress: ProgressCallback = Arc::new(move |percent: u8| {
            let percent = percent.min(100);
            progress.send_if_modified(|current| {
                if percent > *current {
                    *current = percent;
                    true
                } else {
                    false
                }
            });
        });

        let file_name = file.name.clone();
        match self
            .api
            .upload_document(file, Some(on_progress), user_id.as_deref())
            .await
        {
            Ok(document) => {
                {
                    let mut state = lock(&self.state);
                    state.status = UploadStatus::Success;
                    state.uploaded = Some(document.clone());
                }
                self.progress.send_replace(100);

                tracing::info!(document_id = document.id, file_name = %file_name, "Upload complete");
                self.notifier.success(UPLOAD_SUCCEEDED_MESSAGE);
                self.schedule_redirect(epoch);
                SubmitOutcome::Uploaded(document)
            }
            Err(e) => {
                let message = e.detail().unwrap_or(UPLOAD_FAILED_MESSAGE).to_string();
                tracing::warn!(file_name = %file_name, error = %e, "Upload failed");

                let mut state = lock(&self.state);
                state.status = UploadStatus::Error;
                state.error_message = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    /// After the fixed pause, go back to the list and drop the finished
    /// selection unless the user has already moved on.
    fn schedule_redirect(&self, epoch: u64) {
        let navigator = self.navigator.clone();
        let state = self.state.clone();
        let progress = self.progress.clone();
        let delay = self.redirect_delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            navigator.navigate(Route::Documents);

            let mut state = lock(&state);
            if state.epoch == epoch && state.status == UploadStatus::Success {
                *state = UploadState {
                    epoch: epoch + 1,
                    ..UploadState::default()
                };
                progress.send_replace(0);
            }
        });
    }
}
