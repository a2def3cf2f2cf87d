//! In-memory collaborators for exercising controllers without a backend.

use crate::models::{DeleteResponse, Document, User};
use crate::routes::{Navigator, Route};
use crate::services::document_client::{
    ApiError, DocumentApi, ListQuery, ProgressCallback, SortOrder, UploadFile,
};
use crate::services::user_client::UserApi;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Notify;

pub use crate::services::notifier::testing::RecordingNotifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    Get,
    RawContent,
    Upload,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List(ListQuery),
    Get(i64),
    RawContent(i64),
    Upload {
        name: String,
        size: u64,
        user_id: Option<String>,
    },
    Delete(i64),
}

#[derive(Default)]
struct FakeState {
    documents: Vec<Document>,
    contents: HashMap<i64, Vec<u8>>,
    next_id: i64,
    failures: HashMap<Operation, ApiError>,
    progress_steps: Option<Vec<u8>>,
}

/// Behaves like the document API: assigns ids, stores content, lists newest
/// first, and can be told to fail or to hold a call until released.
#[derive(Default)]
pub struct FakeDocumentApi {
    state: Mutex<FakeState>,
    calls: Mutex<Vec<ApiCall>>,
    gates: Mutex<HashMap<Operation, Arc<Notify>>>,
}

impl FakeDocumentApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let api = Self::new();
        {
            let mut state = api.lock_state();
            state.next_id = documents.iter().map(|d| d.id).max().unwrap_or(0);
            state.documents = documents;
        }
        api
    }

    /// Make every call of `operation` fail with `error` until cleared.
    pub fn fail(&self, operation: Operation, error: ApiError) {
        self.lock_state().failures.insert(operation, error);
    }

    /// Percentages reported to the progress callback on upload.
    pub fn set_progress_steps(&self, steps: Vec<u8>) {
        self.lock_state().progress_steps = Some(steps);
    }

    pub fn clear_failures(&self) {
        self.lock_state().failures.clear();
    }

    /// Hold calls of `operation` until [`release`](Self::release) is called.
    pub fn hold(&self, operation: Operation) {
        self.gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(operation, Arc::new(Notify::new()));
    }

    pub fn release(&self, operation: Operation) {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&operation);
        if let Some(gate) = gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    pub fn stored_documents(&self) -> Vec<Document> {
        self.lock_state().documents.clone()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: ApiCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn failure(&self, operation: Operation) -> Option<ApiError> {
        self.lock_state().failures.get(&operation).cloned()
    }

    async fn wait_for_gate(&self, operation: Operation) {
        let gate = self
            .gates
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operation)
            .cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

pub fn sample_document(id: i64, name: &str) -> Document {
    Document {
        id,
        name: name.to_string(),
        size: 1024,
        content_type: "application/octet-stream".to_string(),
        created_at: "2025-01-15T10:30:00".to_string(),
        owner_id: 1,
        last_modified_by: Some("Brave Otter".to_string()),
        path: None,
        versions: vec![],
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound {
        detail: Some("Document not found".to_string()),
    }
}

#[async_trait]
impl DocumentApi for FakeDocumentApi {
    async fn list_documents(&self, query: &ListQuery) -> Result<Vec<Document>, ApiError> {
        self.record(ApiCall::List(query.clone()));
        // The response reflects the data at request time, even if held.
        let snapshot = {
            let mut documents = self.lock_state().documents.clone();
            documents.sort_by_key(|d| d.id);
            if query.order == SortOrder::Desc {
                documents.reverse();
            }
            documents
        };
        self.wait_for_gate(Operation::List).await;

        match self.failure(Operation::List) {
            Some(err) => Err(err),
            None => Ok(snapshot),
        }
    }

    async fn get_document(&self, id: i64) -> Result<Document, ApiError> {
        self.record(ApiCall::Get(id));
        self.wait_for_gate(Operation::Get).await;
        if let Some(err) = self.failure(Operation::Get) {
            return Err(err);
        }

        self.lock_state()
            .documents
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn get_document_raw_content(&self, id: i64) -> Result<String, ApiError> {
        self.record(ApiCall::RawContent(id));
        self.wait_for_gate(Operation::RawContent).await;
        if let Some(err) = self.failure(Operation::RawContent) {
            return Err(err);
        }

        self.lock_state()
            .contents
            .get(&id)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .ok_or_else(not_found)
    }

    async fn upload_document(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        user_id: Option<&str>,
    ) -> Result<Document, ApiError> {
        self.record(ApiCall::Upload {
            name: file.name.clone(),
            size: file.size(),
            user_id: user_id.map(|id| id.to_string()),
        });

        let steps = self
            .lock_state()
            .progress_steps
            .clone()
            .unwrap_or_else(|| vec![0, 25, 50, 75, 100]);
        if let Some(callback) = &on_progress {
            for percent in steps {
                callback(percent);
            }
        }
        self.wait_for_gate(Operation::Upload).await;
        if let Some(err) = self.failure(Operation::Upload) {
            return Err(err);
        }

        let mut state = self.lock_state();
        state.next_id += 1;
        let document = Document {
            id: state.next_id,
            name: file.name.clone(),
            size: file.size(),
            content_type: file.mime_type.clone(),
            created_at: "2025-01-15T10:30:00".to_string(),
            owner_id: 1,
            last_modified_by: None,
            path: Some(format!("uploads/{}", file.name)),
            versions: vec![],
        };
        state.contents.insert(document.id, file.data);
        state.documents.push(document.clone());
        Ok(document)
    }

    async fn delete_document(&self, id: i64) -> Result<DeleteResponse, ApiError> {
        self.record(ApiCall::Delete(id));
        self.wait_for_gate(Operation::Delete).await;
        if let Some(err) = self.failure(Operation::Delete) {
            return Err(err);
        }

        let mut state = self.lock_state();
        let index = state
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(not_found)?;
        let removed = state.documents.remove(index);
        state.contents.remove(&id);

        Ok(DeleteResponse {
            message: format!(
                "Document \"{}\" has been permanently deleted.",
                removed.name
            ),
        })
    }
}

/// Records every navigation request in order.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}

/// Accepts every identity and remembers which ones were synced.
#[derive(Default)]
pub struct FakeUserApi {
    synced: Mutex<Vec<String>>,
    failing: bool,
}

impl FakeUserApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn synced(&self) -> Vec<String> {
        self.synced
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl UserApi for FakeUserApi {
    async fn sync_user(&self, browser_id: &str) -> Result<User, ApiError> {
        let mut synced = self.synced.lock().unwrap_or_else(PoisonError::into_inner);
        synced.push(browser_id.to_string());
        if self.failing {
            return Err(ApiError::Transport("connection refused".into()));
        }
        Ok(User {
            id: synced.len() as i64,
            browser_id: browser_id.to_string(),
            nickname: "Brave Otter".to_string(),
        })
    }
}
