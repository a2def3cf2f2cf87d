use super::{follow_pending, PageChrome};
use crate::controllers::DocumentView;
use crate::routes::Route;
use crate::session::Browser;
use askama::Template;
use axum::{
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};

#[derive(Template)]
#[template(path = "document.html")]
pub struct DocumentTemplate {
    pub chrome: PageChrome,
    pub view: DocumentView,
}

pub async fn view_document_page(browser: Browser, Path(id): Path<i64>) -> Response {
    let here = Route::Document(id);
    if let Some(redirect) = follow_pending(&browser.session, here) {
        return redirect.into_response();
    }

    match browser.session.viewer.load(id).await {
        Some(view) => DocumentTemplate {
            view,
            chrome: PageChrome::for_browser(&browser, here).await,
        }
        .into_response(),
        None => follow_pending(&browser.session, here)
            .unwrap_or_else(|| Redirect::to(&Route::Documents.path()))
            .into_response(),
    }
}
