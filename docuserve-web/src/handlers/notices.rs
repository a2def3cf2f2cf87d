use super::ReturnTo;
use crate::session::Browser;
use axum::{extract::Path, response::Redirect, Form};
use uuid::Uuid;

pub async fn dismiss_notice_handler(
    browser: Browser,
    Path(id): Path<Uuid>,
    Form(form): Form<ReturnTo>,
) -> Redirect {
    if !browser.session.notices.dismiss(id) {
        tracing::debug!(notice_id = %id, "Notice already gone");
    }
    form.redirect()
}
