use super::{follow_pending, PageChrome};
use crate::routes::Route;
use crate::session::Browser;
use askama::Template;
use axum::response::{IntoResponse, Response};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub chrome: PageChrome,
}

pub async fn index(browser: Browser) -> Response {
    if let Some(redirect) = follow_pending(&browser.session, Route::Home) {
        return redirect.into_response();
    }

    IndexTemplate {
        chrome: PageChrome::for_browser(&browser, Route::Home).await,
    }
    .into_response()
}

pub async fn health_check() -> &'static str {
    "OK"
}
