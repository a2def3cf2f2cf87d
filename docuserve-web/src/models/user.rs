use serde::{Deserialize, Serialize};

/// Backend record reconciled from a browser identity token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub browser_id: String,
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct SyncUserRequest<'a> {
    pub browser_id: &'a str,
}
