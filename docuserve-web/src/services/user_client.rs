use crate::config::ApiSettings;
use crate::models::user::{SyncUserRequest, User};
use crate::services::document_client::{decode_json, ApiError};
use crate::services::metrics::record_api_call;
use async_trait::async_trait;
use docuserve_core::observability::TracedClientExt;
use reqwest::Client;
use std::time::Duration;

#[async_trait]
pub trait UserApi: Send + Sync {
    /// Reconcile a browser identity token with the backend's user record.
    async fn sync_user(&self, browser_id: &str) -> Result<User, ApiError>;
}

pub struct UserClient {
    client: Client,
    base_url: String,
}

impl UserClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_sync(&self, url: &str, browser_id: &str) -> Result<User, ApiError> {
        let response = self
            .client
            .traced_post(url)
            .json(&SyncUserRequest { browser_id })
            .send()
            .await?;
        decode_json(response).await
    }
}

#[async_trait]
impl UserApi for UserClient {
    async fn sync_user(&self, browser_id: &str) -> Result<User, ApiError> {
        let url = format!("{}/api/users/sync", self.base_url);
        let result = self.post_sync(&url, browser_id).await;
        record_api_call("sync_user", result.is_ok());

        if let Err(e) = &result {
            tracing::warn!(browser_id = %browser_id, error = %e, "User sync failed");
        }
        result
    }
}
