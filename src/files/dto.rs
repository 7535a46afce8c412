use serde::Serialize;
use uuid::Uuid;

use crate::spreadsheet::Cell;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: &'static str,
    pub file_id: Uuid,
    pub headers: Vec<String>,
    pub preview_rows: Vec<Vec<Cell>>,
    pub total_rows: usize,
}
