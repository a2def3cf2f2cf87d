//! Client-visible routes and the navigation port controllers use to leave a page.

use std::fmt;
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Documents,
    Document(i64),
    Upload,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Documents => "/documents".to_string(),
            Route::Document(id) => format!("/documents/{}", id),
            Route::Upload => "/upload".to_string(),
        }
    }

    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Home),
            "/documents" => Some(Route::Documents),
            "/upload" => Some(Route::Upload),
            _ => trimmed
                .strip_prefix("/documents/")
                .and_then(|id| id.parse::<i64>().ok())
                .filter(|id| *id > 0)
                .map(Route::Document),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Ctrl (or Cmd) plus this key opens the upload page from anywhere.
pub const UPLOAD_SHORTCUT_KEY: char = 'u';

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Remembers the last requested route until the page picks it up.
#[derive(Default)]
pub struct PendingNavigation {
    target: Mutex<Option<Route>>,
}

impl PendingNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Option<Route> {
        self.target
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Navigator for PendingNavigation {
    fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "Navigation requested");
        *self.target.lock().unwrap_or_else(PoisonError::into_inner) = Some(route);
    }
}
