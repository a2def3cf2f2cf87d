//! HTTP client for the DocuServe document API.
//!
//! Every call is a single attempt: no retries and no caching. Failures are
//! classified into [`ApiError`] and left to the caller to surface.

use crate::config::ApiSettings;
use crate::models::{DeleteResponse, Document};
use crate::services::metrics::record_api_call;
use async_trait::async_trait;
use docuserve_core::observability::TracedClientExt;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Header carrying the browser identity token on uploads.
pub const USER_ID_HEADER: &str = "X-User-ID";

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The backend rejected the input (4xx other than 404).
    #[error("Request rejected ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Validation { status: u16, detail: Option<String> },

    #[error("Not found: {}", .detail.as_deref().unwrap_or("resource does not exist"))]
    NotFound { detail: Option<String> },

    /// The backend answered with a 5xx.
    #[error("Server error ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    /// No usable HTTP response: connection, timeout or body decoding failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Message supplied by the backend, if it sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Validation { detail, .. }
            | ApiError::NotFound { detail }
            | ApiError::Server { detail, .. } => detail.as_deref(),
            ApiError::Transport(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListQuery {
    pub sort_by: String,
    pub order: SortOrder,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            sort_by: "id".to_string(),
            order: SortOrder::Desc,
        }
    }
}

/// A file as picked by the user: bytes plus the metadata the browser reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        let mime_type = mime_type.into();
        Self {
            name: name.into(),
            mime_type: if mime_type.trim().is_empty() {
                "application/octet-stream".to_string()
            } else {
                mime_type
            },
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Receives upload progress as a whole percentage (0-100).
pub type ProgressCallback = Arc<dyn Fn(u8) + Send + Sync>;

#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn list_documents(&self, query: &ListQuery) -> Result<Vec<Document>, ApiError>;

    async fn get_document(&self, id: i64) -> Result<Document, ApiError>;

    async fn get_document_raw_content(&self, id: i64) -> Result<String, ApiError>;

    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        user_id: Option<&str>,
    ) -> Result<Document, ApiError>;

    async fn delete_document(&self, id: i64) -> Result<DeleteResponse, ApiError>;
}

pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/documents{}", self.base_url, path)
    }

    async fn fetch_list(&self, url: &str, query: &ListQuery) -> Result<Vec<Document>, ApiError> {
        let response = self.client.traced_get(url).query(query).send().await?;
        decode_json(response).await
    }

    async fn fetch_document(&self, url: &str) -> Result<Document, ApiError> {
        let response = self.client.traced_get(url).send().await?;
        decode_json(response).await
    }

    async fn fetch_raw(&self, url: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .traced_get(url)
            .query(&[("raw", "true")])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.text().await?)
    }

    async fn send_upload(
        &self,
        url: &str,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        user_id: Option<&str>,
    ) -> Result<Document, ApiError> {
        let size = file.size();
        let part = multipart::Part::stream_with_length(progress_body(file.data, on_progress), size)
            .file_name(file.name)
            .mime_str(&file.mime_type)
            .map_err(|e| ApiError::Transport(format!("Invalid content type: {}", e)))?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.traced_post(url).multipart(form);
        if let Some(user_id) = user_id {
            request = request.header(USER_ID_HEADER, user_id);
        }

        decode_json(request.send().await?).await
    }

    async fn send_delete(&self, url: &str) -> Result<DeleteResponse, ApiError> {
        let response = self.client.traced_delete(url).send().await?;
        decode_json(response).await
    }
}

#[async_trait]
impl DocumentApi for DocumentClient {
    async fn list_documents(&self, query: &ListQuery) -> Result<Vec<Document>, ApiError> {
        let url = self.url("");
        finish("list_documents", &url, self.fetch_list(&url, query).await)
    }

    async fn get_document(&self, id: i64) -> Result<Document, ApiError> {
        let url = self.url(&format!("/{}", id));
        finish("get_document", &url, self.fetch_document(&url).await)
    }

    async fn get_document_raw_content(&self, id: i64) -> Result<String, ApiError> {
        let url = self.url(&format!("/{}/view", id));
        finish("get_document_raw_content", &url, self.fetch_raw(&url).await)
    }

    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        user_id: Option<&str>,
    ) -> Result<Document, ApiError> {
        let url = self.url("/upload");
        let file_name = file.name.clone();

        tracing::info!(file_name = %file_name, size = file.size(), "Uploading document");

        let result = self.send_upload(&url, file, on_progress, user_id).await;
        let document = finish("upload_document", &url, result)?;

        tracing::info!(
            document_id = document.id,
            file_name = %file_name,
            "Document uploaded"
        );
        Ok(document)
    }

    async fn delete_document(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        let url = self.url(&format!("/{}", id));
        finish("delete_document", &url, self.send_delete(&url).await)
    }
}

/// Stream the file in fixed chunks, reporting progress as each chunk is handed
/// to the transport.
fn progress_body(data: Vec<u8>, on_progress: Option<ProgressCallback>) -> reqwest::Body {
    let total = data.len();
    if total == 0 {
        if let Some(callback) = &on_progress {
            callback(100);
        }
        return reqwest::Body::from(data);
    }

    let chunks: Vec<Vec<u8>> = data
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|chunk| chunk.to_vec())
        .collect();

    let mut sent = 0usize;
    let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
        sent += chunk.len();
        if let Some(callback) = &on_progress {
            callback(percent(sent, total));
        }
        Ok::<_, std::io::Error>(chunk)
    }));

    reqwest::Body::wrap_stream(stream)
}

fn percent(sent: usize, total: usize) -> u8 {
    ((sent as f64 * 100.0) / total as f64).round().min(100.0) as u8
}

fn finish<T>(operation: &str, url: &str, result: Result<T, ApiError>) -> Result<T, ApiError> {
    record_api_call(operation, result.is_ok());
    if let Err(e) = &result {
        tracing::warn!(operation, url = %url, error = %e, "Document API call failed");
    }
    result
}

pub(crate) async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(error_from_response(response).await)
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Transport(format!("Failed to decode response: {}", e)))
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    // The backend reports failures as `{"detail": "..."}`; anything else
    // (validation arrays, HTML error pages) carries no usable message.
    let detail = response
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| {
            body.get("detail")
                .and_then(|d| d.as_str())
                .map(|d| d.to_string())
        });

    classify(status, detail)
}

fn classify(status: StatusCode, detail: Option<String>) -> ApiError {
    if status == StatusCode::NOT_FOUND {
        ApiError::NotFound { detail }
    } else if status.is_client_error() {
        ApiError::Validation {
            status: status.as_u16(),
            detail,
        }
    } else {
        ApiError::Server {
            status: status.as_u16(),
            detail,
        }
    }
}
