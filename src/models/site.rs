use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

/// Stored result of one generation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SiteRecord {
    pub id: Uuid,
    pub session_id: Option<Uuid>,
    pub name: String,
    pub description: String,
    pub html: String,
    /// Styling is inlined into `html`; kept as a JSON value for the record shape.
    pub css: serde_json::Value,
    pub images: Vec<String>,
    pub variant: u8,
    pub created_at: DateTime<Utc>,
}
