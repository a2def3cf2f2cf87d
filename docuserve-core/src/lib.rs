//! docuserve-core: shared infrastructure for the DocuServe web frontend.
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use tracing;
