pub mod documents;
pub mod upload;
pub mod viewer;

pub use documents::{DocumentListController, ListView};
pub use upload::{SubmitOutcome, UploadController, UploadStatus, UploadView};
pub use viewer::{DocumentView, DocumentViewer, Preview};
