pub mod config;
pub mod controllers;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod startup;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

use config::Settings;
use services::{document_client::DocumentApi, user_client::UserApi};
use session::SessionRegistry;
use std::sync::Arc;

/// Shared application state: backend clients and every browser's session
#[derive(Clone)]
pub struct AppState {
    pub browsers: Arc<SessionRegistry>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(api: Arc<dyn DocumentApi>, users: Arc<dyn UserApi>, settings: Settings) -> Self {
        let browsers = SessionRegistry::new(
            api,
            users,
            settings.upload.clone(),
            settings.viewer.clone(),
        );
        Self {
            browsers: Arc::new(browsers),
            settings: Arc::new(settings),
        }
    }
}
