use serde::Serialize;
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

use super::chart::{ChartData, ChartKind};
use crate::files::UploadedFile;

/// `analyses` row as stored.
#[derive(Debug, FromRow)]
pub struct AnalysisRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub chart_kind: String,
    pub x_column: String,
    pub y_column: String,
    pub title: String,
    pub chart_data: Json<ChartData>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub chart_kind: ChartKind,
    pub x_column: String,
    pub y_column: String,
    pub title: String,
    pub chart_data: ChartData,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<AnalysisRow> for Analysis {
    type Error = anyhow::Error;

    fn try_from(r: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Self {
            chart_kind: r.chart_kind.parse()?,
            id: r.id,
            user_id: r.user_id,
            file_id: r.file_id,
            x_column: r.x_column,
            y_column: r.y_column,
            title: r.title,
            chart_data: r.chart_data.0,
            created_at: r.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub chart_kind: ChartKind,
    pub x_column: String,
    pub y_column: String,
    pub title: String,
    pub chart_data: ChartData,
}

/// History entry: the analysis together with its source file.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisWithFile {
    #[serde(flatten)]
    pub analysis: Analysis,
    pub file: UploadedFile,
}
