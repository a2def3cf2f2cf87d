pub mod app;
pub mod documents;
pub mod metrics;
pub mod notices;
pub mod preferences;
pub mod upload;
pub mod viewer;

use crate::routes::{Route, UPLOAD_SHORTCUT_KEY};
use crate::services::notifier::Notice;
use crate::session::{Browser, BrowserSession};
use axum::response::Redirect;
use serde::Deserialize;

/// Parts of the layout shared by every page.
pub struct PageChrome {
    pub notices: Vec<Notice>,
    pub auto_spell_check: bool,
    pub current_path: String,
    pub upload_shortcut_key: char,
    pub upload_path: String,
}

impl PageChrome {
    pub async fn for_browser(browser: &Browser, here: Route) -> Self {
        Self {
            notices: browser.session.notices.active(),
            auto_spell_check: browser.preferences.get().await.auto_spell_check,
            current_path: here.path(),
            upload_shortcut_key: UPLOAD_SHORTCUT_KEY,
            upload_path: Route::Upload.path(),
        }
    }

    pub fn is_current(&self, path: &str) -> bool {
        self.current_path == path
    }
}

/// Turn a navigation requested by a controller into a redirect, unless the
/// browser is already there.
pub(crate) fn follow_pending(session: &BrowserSession, here: Route) -> Option<Redirect> {
    match session.navigation.take() {
        Some(route) if route != here => {
            tracing::debug!(from = %here, to = %route, "Following pending navigation");
            Some(Redirect::to(&route.path()))
        }
        _ => None,
    }
}

/// Form field naming the page to go back to after a small action.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnTo {
    pub return_to: Option<String>,
}

impl ReturnTo {
    /// Only known application routes are honoured.
    pub fn redirect(&self) -> Redirect {
        let route = self
            .return_to
            .as_deref()
            .and_then(Route::parse)
            .unwrap_or(Route::Home);
        Redirect::to(&route.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn location(redirect: Redirect) -> String {
        redirect.into_response().headers()["location"]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn return_to_accepts_only_known_routes() {
        let to = |s: &str| ReturnTo {
            return_to: Some(s.to_string()),
        };
        assert_eq!(location(to("/documents/7").redirect()), "/documents/7");
        assert_eq!(location(to("https://evil.example/").redirect()), "/");
        assert_eq!(location(to("//evil.example").redirect()), "/");
        assert_eq!(location(ReturnTo::default().redirect()), "/");
    }
}
