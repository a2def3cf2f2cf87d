use super::ReturnTo;
use crate::services::preferences::Preference;
use crate::session::Browser;
use axum::{response::Redirect, Form};
use docuserve_core::error::AppError;

pub async fn toggle_auto_spell_check_handler(
    browser: Browser,
    Form(form): Form<ReturnTo>,
) -> Result<Redirect, AppError> {
    let prefs = browser
        .preferences
        .toggle(Preference::AutoSpellCheck)
        .await
        .map_err(|e| AppError::SessionError(e.to_string()))?;

    tracing::debug!(auto_spell_check = prefs.auto_spell_check, "Preferences updated");
    Ok(form.redirect())
}
