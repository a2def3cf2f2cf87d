mod common;

use common::TestApp;
use docuserve_web::services::document_client::ApiError;
use docuserve_web::testing::{sample_document, ApiCall, FakeDocumentApi, Operation};

const REPORT: &str = "twenty bytes of text";

#[tokio::test]
async fn uploaded_text_file_is_listed_and_shown_verbatim() {
    let app = TestApp::spawn().await;
    assert_eq!(REPORT.len(), 20);

    let response = app.upload("report.txt", "text/plain", REPORT.as_bytes().to_vec()).await;
    assert_eq!(response.url().path(), "/upload");
    let body = app.settled_upload_page().await;
    assert!(body.contains("Document uploaded successfully!"));
    assert!(body.contains("http-equiv=\"refresh\""));

    app.wait_for_redirect().await;
    let (path, body) = app.get_html("/upload").await;
    assert_eq!(path, "/documents");
    assert!(body.contains("report.txt"));

    let stored = app.api.stored_documents();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "report.txt");
    assert_eq!(stored[0].size, 20);

    let (_, body) = app.get_html(&format!("/documents/{}", stored[0].id)).await;
    assert!(body.contains(&format!("<div class=\"preview-text\">{}</div>", REPORT)));
}

#[tokio::test]
async fn upload_page_shows_progress_while_the_backend_is_busy() {
    let app = TestApp::spawn().await;
    app.api.hold(Operation::Upload);

    let response = app.upload("slow.txt", "text/plain", b"slow".to_vec()).await;
    assert!(response.status().is_success());
    assert_eq!(response.url().path(), "/upload");
    let body = response.text().await.unwrap();
    assert!(body.contains("Uploading..."));
    assert!(body.contains("<meta http-equiv=\"refresh\" content=\"1\">"));
    assert!(!body.contains("<form method=\"post\" action=\"/upload\""));
    assert!(app.api.stored_documents().is_empty());

    let (_, body) = app.get_html("/upload").await;
    assert!(body.contains("Uploading..."));

    app.api.release(Operation::Upload);
    let body = app.settled_upload_page().await;
    assert!(body.contains("Document uploaded successfully!"));
    assert_eq!(app.api.stored_documents().len(), 1);
}

#[tokio::test]
async fn uploads_carry_the_browser_identity() {
    let app = TestApp::spawn().await;

    app.upload("report.txt", "text/plain", REPORT.as_bytes().to_vec()).await;
    app.settled_upload_page().await;

    let synced = app.users.synced();
    let uploads: Vec<_> = app
        .api
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            ApiCall::Upload { user_id, .. } => Some(user_id),
            _ => None,
        })
        .collect();
    assert_eq!(uploads, vec![Some(synced[0].clone())]);
}

#[tokio::test]
async fn uploaded_image_has_no_preview() {
    let app = TestApp::spawn().await;

    app.upload("image.png", "image/png", b"R0lGODlhAQABAIAAAP".to_vec()).await;
    app.wait_for_redirect().await;

    let (path, body) = app.get_html("/upload").await;
    assert_eq!(path, "/documents");
    assert!(body.contains("image.png"));

    let id = app.api.stored_documents()[0].id;
    let (_, body) = app.get_html(&format!("/documents/{}", id)).await;
    assert!(body.contains("Preview not available"));
    assert!(!app.api.calls().contains(&ApiCall::RawContent(id)));
}

#[tokio::test]
async fn oversized_file_is_rejected_before_reaching_the_backend() {
    let app = TestApp::spawn().await;

    let response = app
        .upload("huge.bin", "application/octet-stream", vec![0u8; 11 * 1024 * 1024])
        .await;
    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("File size exceeds 10MB limit."));

    assert!(app.api.calls().iter().all(|c| !matches!(c, ApiCall::Upload { .. })));
    let (_, body) = app.get_html("/documents").await;
    assert!(body.contains("No documents found."));
}

#[tokio::test]
async fn failed_upload_keeps_the_file_for_retry() {
    let app = TestApp::spawn().await;
    app.api.fail(
        Operation::Upload,
        ApiError::Validation {
            status: 400,
            detail: Some("Filename cannot be empty.".into()),
        },
    );

    app.upload("notes.txt", "text/plain", b"hello".to_vec()).await;
    let body = app.settled_upload_page().await;
    assert!(body.contains("Filename cannot be empty."));
    assert!(body.contains("notes.txt"));
    assert!(body.contains("/upload/retry"));

    app.api.clear_failures();
    app.post("/upload/retry").await;
    let body = app.settled_upload_page().await;
    assert!(body.contains("Document uploaded successfully!"));
    assert_eq!(app.api.stored_documents().len(), 1);
}

#[tokio::test]
async fn cancel_clears_the_selection() {
    let app = TestApp::spawn().await;
    app.api.fail(Operation::Upload, ApiError::Transport("connection reset".into()));

    app.upload("notes.txt", "text/plain", b"hello".to_vec()).await;
    let body = app.settled_upload_page().await;
    assert!(body.contains("Upload failed. Please try again."));

    let body = app.post("/upload/cancel").await.text().await.unwrap();
    assert!(!body.contains("notes.txt"));
    assert!(!body.contains("Upload failed"));
}

#[tokio::test]
async fn deleting_a_document_removes_its_row() {
    let app = TestApp::spawn_with(FakeDocumentApi::with_documents(vec![
        sample_document(1, "keep.pdf"),
        sample_document(2, "x.txt"),
    ]))
    .await;

    let (_, body) = app.get_html("/documents").await;
    assert!(body.contains("x.txt"));

    let body = app.post("/documents/2/delete").await.text().await.unwrap();
    assert!(body.contains("permanently delete <strong>x.txt</strong>"));

    let body = app.post("/documents/confirm-delete").await.text().await.unwrap();
    assert!(!body.contains(">x.txt<"));
    assert!(body.contains("keep.pdf"));
    assert!(body.contains("permanently deleted"));
}

#[tokio::test]
async fn cancelled_delete_leaves_the_list_alone() {
    let app = TestApp::spawn_with(FakeDocumentApi::with_documents(vec![sample_document(
        1, "x.txt",
    )]))
    .await;

    app.get_html("/documents").await;
    app.post("/documents/1/delete").await;
    let body = app.post("/documents/cancel-delete").await.text().await.unwrap();

    assert!(body.contains("x.txt"));
    assert!(!body.contains("role=\"dialog\""));
    assert!(!app.api.calls().contains(&ApiCall::Delete(1)));
}

#[tokio::test]
async fn deleting_an_unlisted_document_is_not_found() {
    let app = TestApp::spawn().await;
    app.get_html("/documents").await;

    let response = app.post("/documents/42/delete").await;
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_document_sends_the_viewer_back_to_the_list() {
    let app = TestApp::spawn().await;

    let (path, body) = app.get_html("/documents/99").await;
    assert_eq!(path, "/documents");
    assert!(body.contains("Failed to load document"));
}

#[tokio::test]
async fn list_failure_shows_an_error_notice() {
    let app = TestApp::spawn().await;
    app.api.fail(Operation::List, ApiError::Transport("connection refused".into()));

    let (_, body) = app.get_html("/documents").await;
    assert!(body.contains("Failed to load documents"));
    assert!(body.contains("toast-error"));
}

#[tokio::test]
async fn notices_can_be_dismissed() {
    let app = TestApp::spawn().await;
    app.api.fail(Operation::List, ApiError::Transport("connection refused".into()));
    let (_, body) = app.get_html("/documents").await;

    let marker = "action=\"/notices/";
    let start = body.find(marker).expect("notice form") + marker.len();
    let id = &body[start..start + 36];
    app.api.clear_failures();

    let response = app
        .client
        .post(app.url(&format!("/notices/{}/dismiss", id)))
        .form(&[("return_to", "/")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.url().path(), "/");
    assert!(!response.text().await.unwrap().contains("Failed to load documents"));
}
