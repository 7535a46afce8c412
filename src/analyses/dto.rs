use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::chart::{ChartData, ChartKind};

/// Body of `POST /analyze`. The older `chartType`/`xAxis`/`yAxis`/`chartTitle`
/// names are accepted as aliases.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub file_id: Option<String>,
    #[serde(alias = "chartType")]
    pub chart_kind: Option<String>,
    #[serde(alias = "xAxis")]
    pub x_column: Option<String>,
    #[serde(alias = "yAxis")]
    pub y_column: Option<String>,
    #[serde(alias = "chartTitle")]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub analysis_id: Uuid,
    pub chart_data: ChartData,
    pub chart_kind: ChartKind,
    pub title: String,
    pub x_column: String,
    pub y_column: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
