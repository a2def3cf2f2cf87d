//! User preferences persisted alongside the browser identity.

use crate::services::storage::{BrowserStorage, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const PREFERENCES_KEY: &str = "docuserve_preferences";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserPreferences {
    pub auto_spell_check: bool,
}

/// Partial update; `None` fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub auto_spell_check: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    AutoSpellCheck,
}

pub struct PreferencesStore {
    storage: Arc<dyn BrowserStorage>,
}

impl PreferencesStore {
    pub fn new(storage: Arc<dyn BrowserStorage>) -> Self {
        Self { storage }
    }

    /// Stored preferences merged over the defaults. Never fails: unreadable
    /// state is logged and the defaults are returned.
    pub async fn get(&self) -> UserPreferences {
        match self.storage.get(PREFERENCES_KEY).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Discarding unreadable preferences");
                UserPreferences::default()
            }),
            Ok(None) => UserPreferences::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load preferences");
                UserPreferences::default()
            }
        }
    }

    pub async fn set(&self, update: PreferencesUpdate) -> Result<UserPreferences, StorageError> {
        let mut prefs = self.get().await;
        if let Some(value) = update.auto_spell_check {
            prefs.auto_spell_check = value;
        }

        self.storage
            .set(PREFERENCES_KEY, serde_json::to_string(&prefs)?)
            .await?;
        Ok(prefs)
    }

    pub async fn toggle(&self, preference: Preference) -> Result<UserPreferences, StorageError> {
        let current = self.get().await;
        let update = match preference {
            Preference::AutoSpellCheck => PreferencesUpdate {
                auto_spell_check: Some(!current.auto_spell_check),
            },
        };
        self.set(update).await
    }
}
