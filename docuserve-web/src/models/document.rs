use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Stored file metadata as returned by the document API.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub created_at: String,
    pub owner_id: i64,
    #[serde(default)]
    pub last_modified_by: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub versions: Vec<DocumentVersion>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentVersion {
    #[serde(default)]
    pub id: Option<i64>,
    pub version_number: i64,
    pub path: String,
    pub created_at: String,
    #[serde(default)]
    pub size: Option<u64>,
    pub document_id: i64,
    #[serde(default)]
    pub last_modified_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DeleteResponse {
    #[serde(default)]
    pub message: String,
}

const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

impl Document {
    pub fn modified_by_display(&self) -> &str {
        match self.last_modified_by.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => "Unknown",
        }
    }

    /// Whether the name carries one of `extensions` (case-insensitive).
    pub fn has_extension(&self, extensions: &[String]) -> bool {
        let name = self.name.to_lowercase();
        extensions
            .iter()
            .any(|ext| name.ends_with(&ext.to_lowercase()))
    }

    pub fn human_size(&self) -> String {
        human_size(self.size)
    }

    /// `YYYY-MM-DD, HH:MM`, or the raw value when it isn't a timestamp we know.
    pub fn created_display(&self) -> String {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.created_at) {
            return ts.format("%Y-%m-%d, %H:%M").to_string();
        }
        // The backend serialises naive UTC datetimes without an offset.
        match NaiveDateTime::parse_from_str(&self.created_at, "%Y-%m-%dT%H:%M:%S%.f") {
            Ok(ts) => ts.format("%Y-%m-%d, %H:%M").to_string(),
            Err(_) => self.created_at.clone(),
        }
    }
}

pub fn human_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}
