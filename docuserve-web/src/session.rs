//! Per-browser controller state, keyed by the identity stored in the session.

use crate::config::{UploadSettings, ViewerSettings};
use crate::controllers::{DocumentListController, DocumentViewer, UploadController};
use crate::routes::PendingNavigation;
use crate::services::document_client::DocumentApi;
use crate::services::identity::{IdentityProvider, KnownIdentity, StoredIdentity};
use crate::services::notifier::NoticeBoard;
use crate::services::preferences::PreferencesStore;
use crate::services::storage::{BrowserStorage, SessionStorage};
use crate::services::user_client::UserApi;
use crate::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docuserve_core::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tower_sessions::Session;

/// Everything one browser sees: its notices, where it should go next, and
/// the state of each page.
pub struct BrowserSession {
    pub browser_id: String,
    pub notices: Arc<NoticeBoard>,
    pub navigation: Arc<PendingNavigation>,
    pub documents: DocumentListController,
    pub upload: UploadController,
    pub viewer: DocumentViewer,
    last_seen: Mutex<Instant>,
    /// Set once the browser comes back with its cookie.
    returned: AtomicBool,
}

impl BrowserSession {
    pub fn new(
        browser_id: &str,
        api: Arc<dyn DocumentApi>,
        upload: &UploadSettings,
        viewer: &ViewerSettings,
    ) -> Self {
        let notices = Arc::new(NoticeBoard::new());
        let navigation = Arc::new(PendingNavigation::new());
        let identity = Arc::new(KnownIdentity(browser_id.to_string()));

        Self {
            browser_id: browser_id.to_string(),
            documents: DocumentListController::new(api.clone(), notices.clone()),
            upload: UploadController::new(
                api.clone(),
                notices.clone(),
                navigation.clone(),
                identity,
                upload,
            ),
            viewer: DocumentViewer::new(
                api,
                notices.clone(),
                navigation.clone(),
                viewer.text_extensions.clone(),
            ),
            notices,
            navigation,
            last_seen: Mutex::new(Instant::now()),
            returned: AtomicBool::new(false),
        }
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn has_returned(&self) -> bool {
        self.returned.load(Ordering::Relaxed)
    }

    fn idle_for(&self) -> Duration {
        self.last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .elapsed()
    }
}

pub struct SessionRegistry {
    sessions: DashMap<String, Arc<BrowserSession>>,
    api: Arc<dyn DocumentApi>,
    users: Arc<dyn UserApi>,
    upload: UploadSettings,
    viewer: ViewerSettings,
}

impl SessionRegistry {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        users: Arc<dyn UserApi>,
        upload: UploadSettings,
        viewer: ViewerSettings,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            api,
            users,
            upload,
            viewer,
        }
    }

    /// Return the browser's session, creating it and reconciling the identity
    /// with the backend on first sight.
    pub async fn resolve(&self, browser_id: &str) -> Arc<BrowserSession> {
        let (session, created) = match self.sessions.entry(browser_id.to_string()) {
            Entry::Occupied(entry) => {
                entry.get().returned.store(true, Ordering::Relaxed);
                (Arc::clone(entry.get()), false)
            }
            Entry::Vacant(entry) => {
                let session = Arc::new(BrowserSession::new(
                    browser_id,
                    self.api.clone(),
                    &self.upload,
                    &self.viewer,
                ));
                entry.insert(session.clone());
                (session, true)
            }
        };
        session.touch();

        if created {
            match self.users.sync_user(browser_id).await {
                Ok(user) => tracing::info!(
                    browser_id = %browser_id,
                    user_id = user.id,
                    nickname = %user.nickname,
                    "Browser identity synced"
                ),
                Err(e) => tracing::warn!(browser_id = %browser_id, error = %e, "Failed to sync browser identity"),
            }
        }

        session
    }

    pub fn get(&self, browser_id: &str) -> Option<Arc<BrowserSession>> {
        self.sessions.get(browser_id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop sessions not seen for at least `max_idle`. Sessions whose browser
    /// never came back after the first request go after `first_visit_idle`.
    /// Returns how many went.
    pub fn evict_idle(&self, max_idle: Duration, first_visit_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| {
            let limit = if session.has_returned() {
                max_idle
            } else {
                first_visit_idle
            };
            session.idle_for() < limit
        });
        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            tracing::info!(evicted, remaining = self.sessions.len(), "Evicted idle browser sessions");
        }
        evicted
    }
}

/// The calling browser's controllers plus its persisted preferences.
pub struct Browser {
    pub session: Arc<BrowserSession>,
    pub preferences: PreferencesStore,
}

#[async_trait]
impl FromRequestParts<AppState> for Browser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| AppError::SessionError(msg.to_string()))?;
        let storage: Arc<dyn BrowserStorage> = Arc::new(SessionStorage::new(session));

        let browser_id = StoredIdentity::new(storage.clone())
            .get_or_create_id()
            .await
            .map_err(|e| AppError::SessionError(e.to_string()))?;

        Ok(Browser {
            session: state.browsers.resolve(&browser_id).await,
            preferences: PreferencesStore::new(storage),
        })
    }
}
