use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Metadata of one ingested spreadsheet.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    #[serde(skip_serializing)]
    pub path: String,
    pub headers: Vec<String>,
    pub row_count: i64,
    pub file_size: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    /// Analyses derived from this file, in creation order.
    #[serde(rename = "analyses")]
    pub analysis_ids: Vec<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewUploadedFile {
    pub user_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub path: String,
    pub headers: Vec<String>,
    pub row_count: i64,
    pub file_size: i64,
}
