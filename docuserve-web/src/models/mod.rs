pub mod document;
pub mod user;

pub use document::{DeleteResponse, Document, DocumentVersion};
pub use user::User;
