//! Per-browser identity token attached to uploads.

use crate::services::storage::{BrowserStorage, StorageError};
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;

pub const BROWSER_ID_KEY: &str = "docuserve_browser_id";

const ID_PREFIX: &str = "user_";
const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_RANDOM_LEN: usize = 7;

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Return the stable identity, creating it on first use.
    async fn get_or_create_id(&self) -> Result<String, StorageError>;
}

/// Identity persisted in browser storage under [`BROWSER_ID_KEY`].
pub struct StoredIdentity {
    storage: Arc<dyn BrowserStorage>,
}

impl StoredIdentity {
    pub fn new(storage: Arc<dyn BrowserStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl IdentityProvider for StoredIdentity {
    async fn get_or_create_id(&self) -> Result<String, StorageError> {
        if let Some(id) = self.storage.get(BROWSER_ID_KEY).await? {
            if !id.is_empty() {
                return Ok(id);
            }
        }

        let id = generate_browser_id();
        self.storage.set(BROWSER_ID_KEY, id.clone()).await?;
        tracing::info!(browser_id = %id, "Created browser identity");
        Ok(id)
    }
}

/// An identity that was already resolved for the current browser.
#[derive(Debug, Clone)]
pub struct KnownIdentity(pub String);

#[async_trait]
impl IdentityProvider for KnownIdentity {
    async fn get_or_create_id(&self) -> Result<String, StorageError> {
        Ok(self.0.clone())
    }
}

/// `user_` followed by seven lowercase base-36 characters.
pub fn generate_browser_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..ID_RANDOM_LEN)
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", ID_PREFIX, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStorage;

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate_browser_id();
        assert!(id.starts_with("user_"));
        assert_eq!(id.len(), 12);
        assert!(id[5..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[tokio::test]
    async fn creates_once_then_reuses() {
        let storage = Arc::new(MemoryStorage::new());
        let identity = StoredIdentity::new(storage.clone());

        let first = identity.get_or_create_id().await.unwrap();
        let second = identity.get_or_create_id().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(storage.get(BROWSER_ID_KEY).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn keeps_existing_value() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(BROWSER_ID_KEY, "user_abc1234".to_string())
            .await
            .unwrap();

        let identity = StoredIdentity::new(storage);
        assert_eq!(identity.get_or_create_id().await.unwrap(), "user_abc1234");
    }
}
