//! Document list and its delete-confirmation workflow.
//!
//! Deletion is optimistic: a confirmed delete removes the row locally without
//! re-fetching. `refresh` and `confirm_delete` are not serialised against each
//! other, so a refresh that was already in flight can briefly bring a deleted
//! row back until the next refresh.

use crate::models::Document;
use crate::services::document_client::{DocumentApi, ListQuery};
use crate::services::notifier::Notifier;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load documents";

/// Render-ready snapshot of the list page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
    pub documents: Vec<Document>,
    pub loading: bool,
    /// True only while a delete call for `delete_target` is outstanding.
    pub deleting: bool,
    pub delete_target: Option<Document>,
}

pub struct DocumentListController {
    api: Arc<dyn DocumentApi>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ListView>,
}

impl DocumentListController {
    pub fn new(api: Arc<dyn DocumentApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: Mutex::new(ListView::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ListView> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ListView {
        self.state().clone()
    }

    /// Look up a listed document by id.
    pub fn document(&self, id: i64) -> Option<Document> {
        self.state().documents.iter().find(|d| d.id == id).cloned()
    }

    /// Replace the collection with the backend's, in the order returned.
    pub async fn refresh(&self) {
        {
            let mut state = self.state();
            if state.loading {
                tracing::debug!("Refresh already in flight");
                return;
            }
            state.loading = true;
        }

        let result = self.api.list_documents(&ListQuery::default()).await;

        let failed = {
            let mut state = self.state();
            state.loading = false;
            match result {
                Ok(documents) => {
                    tracing::debug!(count = documents.len(), "Document list refreshed");
                    state.documents = documents;
                    None
                }
                Err(e) => Some(e),
            }
        };

        if let Some(e) = failed {
            tracing::error!(error = %e, "Failed to fetch documents");
            self.notifier.error(LOAD_FAILED_MESSAGE);
        }
    }

    pub fn request_delete(&self, document: Document) {
        let mut state = self.state();
        if state.deleting {
            tracing::debug!(document_id = document.id, "Delete in flight; ignoring request");
            return;
        }
        tracing::debug!(document_id = document.id, "Delete requested");
        state.delete_target = Some(document);
    }

    pub fn cancel_delete(&self) {
        let mut state = self.state();
        if state.deleting {
            return;
        }
        state.delete_target = None;
    }

    pub async fn confirm_delete(&self) {
        let target = {
            let mut state = self.state();
            if state.deleting {
                return;
            }
            let Some(target) = state.delete_target.clone() else {
                return;
            };
            state.deleting = true;
            target
        };

        match self.api.delete_document(target.id).await {
            Ok(response) => {
                {
                    let mut state = self.state();
                    state.documents.retain(|d| d.id != target.id);
                    state.delete_target = None;
                    state.deleting = false;
                }

                tracing::info!(document_id = target.id, name = %target.name, "Document deleted");
                let message = if response.message.trim().is_empty() {
                    format!("Document \"{}\" has been permanently deleted.", target.name)
                } else {
                    response.message
                };
                self.notifier.success(&message);
            }
            Err(e) => {
                self.state().deleting = false;

                tracing::error!(document_id = target.id, error = %e, "Failed to delete document");
                let message = e.detail().map(|d| d.to_string()).unwrap_or_else(|| {
                    format!("Failed to delete \"{}\". Please try again.", target.name)
                });
                self.notifier.error(&message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::document_client::ApiError;
    use crate::services::notifier::NoticeKind;
    use crate::testing::{sample_document, ApiCall, FakeDocumentApi, Operation, RecordingNotifier};

    fn setup(docs: Vec<Document>) -> (Arc<FakeDocumentApi>, Arc<RecordingNotifier>, Arc<DocumentListController>) {
        let api = Arc::new(FakeDocumentApi::with_documents(docs));
        let notifier = Arc::new(RecordingNotifier::new());
        let controller = Arc::new(DocumentListController::new(api.clone(), notifier.clone()));
        (api, notifier, controller)
    }

    fn ids(view: &ListView) -> Vec<i64> {
        view.documents.iter().map(|d| d.id).collect()
    }

    fn three_docs() -> Vec<Document> {
        vec![
            sample_document(1, "a.txt"),
            sample_document(2, "b.pdf"),
            sample_document(3, "x.txt"),
        ]
    }

    #[tokio::test]
    async fn refresh_keeps_backend_order() {
        let (api, notifier, controller) = setup(three_docs());
        controller.refresh().await;

        let view = controller.snapshot();
        assert_eq!(ids(&view), vec![3, 2, 1]);
        assert!(!view.loading);
        assert_eq!(api.calls(), vec![ApiCall::List(ListQuery::default())]);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_collection() {
        let (api, notifier, controller) = setup(three_docs());
        controller.refresh().await;

        api.fail(Operation::List, ApiError::Transport("connection refused".into()));
        controller.refresh().await;

        let view = controller.snapshot();
        assert_eq!(ids(&view), vec![3, 2, 1]);
        assert!(!view.loading);
        assert_eq!(notifier.messages(NoticeKind::Error), vec![LOAD_FAILED_MESSAGE]);
    }

    #[tokio::test]
    async fn failed_first_load_leaves_empty_list() {
        let (api, notifier, controller) = setup(three_docs());
        api.fail(Operation::List, ApiError::Server { status: 500, detail: None });

        controller.refresh().await;

        assert!(controller.snapshot().documents.is_empty());
        assert_eq!(notifier.count(NoticeKind::Error), 1);
    }

    #[tokio::test]
    async fn loading_flag_visible_while_listing() {
        let (api, _, controller) = setup(three_docs());
        api.hold(Operation::List);

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.refresh().await }
        });
        tokio::task::yield_now().await;
        while !controller.snapshot().loading {
            tokio::task::yield_now().await;
        }

        // A second refresh while loading is ignored.
        controller.refresh().await;
        assert_eq!(api.call_count(), 1);

        api.release(Operation::List);
        pending.await.unwrap();
        assert!(!controller.snapshot().loading);
    }

    #[tokio::test]
    async fn request_then_cancel_changes_nothing() {
        let (api, notifier, controller) = setup(three_docs());
        controller.refresh().await;
        let before = controller.snapshot();
        let calls_before = api.call_count();

        for doc in before.documents.clone() {
            controller.request_delete(doc.clone());
            assert_eq!(controller.snapshot().delete_target, Some(doc));
            controller.cancel_delete();
        }

        let after = controller.snapshot();
        assert_eq!(after.documents, before.documents);
        assert!(after.delete_target.is_none());
        assert_eq!(api.call_count(), calls_before);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn cancel_twice_is_harmless() {
        let (_, notifier, controller) = setup(three_docs());
        controller.refresh().await;
        let before = controller.snapshot();

        controller.cancel_delete();
        controller.cancel_delete();

        assert_eq!(controller.snapshot(), before);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn confirm_removes_exactly_the_target() {
        for target_id in [1, 2, 3] {
            let (api, notifier, controller) = setup(three_docs());
            controller.refresh().await;

            let target = controller.document(target_id).unwrap();
            controller.request_delete(target.clone());
            controller.confirm_delete().await;

            let view = controller.snapshot();
            let expected: Vec<i64> = [3, 2, 1].into_iter().filter(|id| *id != target_id).collect();
            assert_eq!(ids(&view), expected);
            assert!(view.delete_target.is_none());
            assert!(!view.deleting);
            assert_eq!(
                notifier.messages(NoticeKind::Success),
                vec![format!("Document \"{}\" has been permanently deleted.", target.name)]
            );
            // No reconciling re-fetch after the delete.
            assert_eq!(
                api.calls(),
                vec![ApiCall::List(ListQuery::default()), ApiCall::Delete(target_id)]
            );
        }
    }

    #[tokio::test]
    async fn failed_confirm_keeps_target_for_retry() {
        let (api, notifier, controller) = setup(three_docs());
        controller.refresh().await;
        let target = controller.document(3).unwrap();
        controller.request_delete(target.clone());

        api.fail(Operation::Delete, ApiError::Transport("timed out".into()));
        controller.confirm_delete().await;

        let view = controller.snapshot();
        assert_eq!(ids(&view), vec![3, 2, 1]);
        assert_eq!(view.delete_target, Some(target));
        assert!(!view.deleting);
        assert_eq!(
            notifier.messages(NoticeKind::Error),
            vec!["Failed to delete \"x.txt\". Please try again.".to_string()]
        );
        assert_eq!(notifier.count(NoticeKind::Success), 0);

        api.clear_failures();
        controller.confirm_delete().await;
        assert_eq!(ids(&controller.snapshot()), vec![2, 1]);
    }

    #[tokio::test]
    async fn failed_confirm_surfaces_server_detail() {
        let (api, notifier, controller) = setup(three_docs());
        controller.refresh().await;
        controller.request_delete(controller.document(2).unwrap());

        api.fail(
            Operation::Delete,
            ApiError::NotFound {
                detail: Some("Document not found".into()),
            },
        );
        controller.confirm_delete().await;

        assert_eq!(notifier.messages(NoticeKind::Error), vec!["Document not found"]);
    }

    #[tokio::test]
    async fn confirm_without_target_is_noop() {
        let (api, notifier, controller) = setup(three_docs());
        controller.confirm_delete().await;
        assert_eq!(api.call_count(), 0);
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn controls_locked_while_deleting() {
        let (api, _, controller) = setup(three_docs());
        controller.refresh().await;
        let target = controller.document(3).unwrap();
        controller.request_delete(target.clone());
        api.hold(Operation::Delete);

        let pending = tokio::spawn({
            let controller = controller.clone();
            async move { controller.confirm_delete().await }
        });
        while !controller.snapshot().deleting {
            tokio::task::yield_now().await;
        }

        controller.cancel_delete();
        controller.request_delete(controller.document(1).unwrap());
        controller.confirm_delete().await;
        let view = controller.snapshot();
        assert_eq!(view.delete_target, Some(target));
        assert!(view.deleting);

        api.release(Operation::Delete);
        pending.await.unwrap();
        let view = controller.snapshot();
        assert!(!view.deleting);
        assert_eq!(ids(&view), vec![2, 1]);
        assert_eq!(
            api.calls().iter().filter(|c| matches!(c, ApiCall::Delete(_))).count(),
            1
        );
    }

    #[tokio::test]
    async fn stale_refresh_can_bring_back_deleted_row() {
        let (api, _, controller) = setup(three_docs());
        controller.refresh().await;
        controller.request_delete(controller.document(3).unwrap());

        // Refresh goes out before the delete and answers after it.
        api.hold(Operation::List);
        let refresh = tokio::spawn({
            let controller = controller.clone();
            async move { controller.refresh().await }
        });
        while !controller.snapshot().loading {
            tokio::task::yield_now().await;
        }

        controller.confirm_delete().await;
        assert_eq!(ids(&controller.snapshot()), vec![2, 1]);

        api.release(Operation::List);
        refresh.await.unwrap();
        assert_eq!(ids(&controller.snapshot()), vec![3, 2, 1]);

        controller.refresh().await;
        assert_eq!(ids(&controller.snapshot()), vec![2, 1]);
    }
}
