//! Single-document view: metadata plus an inline body for plain-text files.

use crate::models::Document;
use crate::routes::{Navigator, Route};
use crate::services::document_client::DocumentApi;
use crate::services::notifier::Notifier;
use std::sync::Arc;

pub const LOAD_DOCUMENT_FAILED_MESSAGE: &str = "Failed to load document";
pub const LOAD_CONTENT_FAILED_MESSAGE: &str = "Failed to load content.";
pub const PREVIEW_UNAVAILABLE_MESSAGE: &str = "Preview not available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    Text(String),
    /// The body of a text document could not be fetched.
    LoadFailed,
    Unavailable,
}

impl Preview {
    pub fn text(&self) -> &str {
        match self {
            Preview::Text(body) => body,
            Preview::LoadFailed => LOAD_CONTENT_FAILED_MESSAGE,
            Preview::Unavailable => PREVIEW_UNAVAILABLE_MESSAGE,
        }
    }

    pub fn is_inline(&self) -> bool {
        !matches!(self, Preview::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentView {
    pub document: Document,
    pub preview: Preview,
}

pub struct DocumentViewer {
    api: Arc<dyn DocumentApi>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    text_extensions: Vec<String>,
}

impl DocumentViewer {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
        text_extensions: Vec<String>,
    ) -> Self {
        Self {
            api,
            notifier,
            navigator,
            text_extensions,
        }
    }

    /// Returns `None` after sending the user back to the list when the
    /// document itself cannot be loaded.
    pub async fn load(&self, id: i64) -> Option<DocumentView> {
        let document = match self.api.get_document(id).await {
            Ok(document) => document,
            Err(e) => {
                tracing::error!(document_id = id, error = %e, "Failed to load document");
                self.notifier.error(LOAD_DOCUMENT_FAILED_MESSAGE);
                self.navigator.navigate(Route::Documents);
                return None;
            }
        };

        let preview = if document.has_extension(&self.text_extensions) {
            match self.api.get_document_raw_content(id).await {
                Ok(body) => Preview::Text(body),
                Err(e) => {
                    tracing::warn!(document_id = id, error = %e, "Failed to fetch text content");
                    Preview::LoadFailed
                }
            }
        } else {
            Preview::Unavailable
        };

        Some(DocumentView { document, preview })
    }
}
