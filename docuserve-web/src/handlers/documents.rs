use super::{follow_pending, PageChrome};
use crate::controllers::ListView;
use crate::routes::Route;
use crate::session::Browser;
use askama::Template;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use docuserve_core::error::AppError;

#[derive(Template)]
#[template(path = "documents.html")]
pub struct DocumentsTemplate {
    pub chrome: PageChrome,
    pub view: ListView,
}

pub async fn list_documents_page(browser: Browser) -> Response {
    if let Some(redirect) = follow_pending(&browser.session, Route::Documents) {
        return redirect.into_response();
    }

    let documents = &browser.session.documents;
    documents.refresh().await;

    DocumentsTemplate {
        view: documents.snapshot(),
        chrome: PageChrome::for_browser(&browser, Route::Documents).await,
    }
    .into_response()
}

pub async fn request_delete_handler(
    browser: Browser,
    Path(id): Path<i64>,
) -> Result<Redirect, AppError> {
    let documents = &browser.session.documents;
    let document = documents.document(id).ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Document {} is not in the current list", id))
    })?;

    documents.request_delete(document);
    Ok(Redirect::to(&Route::Documents.path()))
}

pub async fn confirm_delete_handler(browser: Browser) -> Redirect {
    browser.session.documents.confirm_delete().await;
    Redirect::to(&Route::Documents.path())
}

pub async fn cancel_delete_handler(browser: Browser) -> Redirect {
    browser.session.documents.cancel_delete();
    Redirect::to(&Route::Documents.path())
}
