pub mod document_client;
pub mod identity;
pub mod metrics;
pub mod notifier;
pub mod preferences;
pub mod storage;
pub mod user_client;
