use std::collections::{HashMap, HashSet};

use tracing::{info, warn};
use uuid::Uuid;

use super::{
    chart::{self, ChartKind},
    dto::AnalyzeRequest,
    repo_types::{Analysis, AnalysisWithFile, NewAnalysis},
};
use crate::{
    error::{AppError, AppResult},
    files::UploadedFile,
    spreadsheet::{self, decode_blocking},
    state::AppState,
};

/// Validated input of the analysis builder.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub file_id: Uuid,
    pub chart_kind: ChartKind,
    pub x_column: String,
    pub y_column: String,
    pub title: Option<String>,
}

fn required(field: Option<String>) -> AppResult<String> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::MissingFields)
}

impl TryFrom<AnalyzeRequest> for BuildRequest {
    type Error = AppError;

    fn try_from(req: AnalyzeRequest) -> Result<Self, Self::Error> {
        let file_id = required(req.file_id)?;
        let chart_kind = required(req.chart_kind)?;
        let x_column = required(req.x_column)?;
        let y_column = required(req.y_column)?;

        let chart_kind = chart_kind
            .parse()
            .map_err(|_| AppError::Validation(format!("Unsupported chart kind: {chart_kind}")))?;
        // An id that cannot exist is reported like any other missing file.
        let file_id = Uuid::parse_str(file_id.trim()).map_err(|_| AppError::NotFound("File"))?;

        Ok(Self {
            file_id,
            chart_kind,
            x_column,
            y_column,
            title: req.title.filter(|t| !t.trim().is_empty()),
        })
    }
}

/// Builds, stores and back-links a chart analysis of one of the owner's files.
///
/// The workbook is re-read and re-decoded on every call.
pub async fn build(state: &AppState, owner_id: Uuid, req: BuildRequest) -> AppResult<Analysis> {
    let file = state
        .files
        .get(req.file_id, owner_id)
        .await?
        .ok_or(AppError::NotFound("File"))?;

    let bytes = state.storage.get_object(&file.path).await?;
    let records = decode_blocking(bytes, spreadsheet::parse_as_records).await??;

    let chart_data = chart::project(&records, req.chart_kind, &req.x_column, &req.y_column)
        .map_err(|_| {
            warn!(file_id = %file.id, x = %req.x_column, y = %req.y_column, "selected columns not found");
            AppError::InvalidColumns
        })?;

    let title = req
        .title
        .unwrap_or_else(|| format!("{} vs {}", req.y_column, req.x_column));

    let analysis = state
        .analyses
        .create(NewAnalysis {
            user_id: owner_id,
            file_id: file.id,
            chart_kind: req.chart_kind,
            x_column: req.x_column,
            y_column: req.y_column,
            title,
            chart_data,
        })
        .await?;
    state.files.link_analysis(file.id, analysis.id).await?;

    info!(
        analysis_id = %analysis.id,
        file_id = %file.id,
        kind = %analysis.chart_kind,
        points = records.len(),
        "analysis built"
    );
    Ok(analysis)
}

/// The owner's analyses, newest first, each with its source file.
pub async fn history(state: &AppState, owner_id: Uuid) -> AppResult<Vec<AnalysisWithFile>> {
    let analyses = state.analyses.list_for_owner(owner_id).await?;

    let mut seen = HashSet::new();
    let file_ids: Vec<Uuid> = analyses
        .iter()
        .map(|a| a.file_id)
        .filter(|id| seen.insert(*id))
        .collect();
    let files: HashMap<Uuid, UploadedFile> = state
        .files
        .get_many(&file_ids)
        .await?
        .into_iter()
        .map(|f| (f.id, f))
        .collect();

    Ok(analyses
        .into_iter()
        .filter_map(|analysis| {
            let Some(file) = files.get(&analysis.file_id).cloned() else {
                warn!(analysis_id = %analysis.id, file_id = %analysis.file_id, "source file missing");
                return None;
            };
            Some(AnalysisWithFile { analysis, file })
        })
        .collect())
}

/// Deletes one of the owner's analyses. The id stays in the source file's
/// back-reference list.
pub async fn delete(state: &AppState, owner_id: Uuid, analysis_id: Uuid) -> AppResult<()> {
    if !state.analyses.delete(analysis_id, owner_id).await? {
        return Err(AppError::NotFound("Analysis"));
    }
    info!(%analysis_id, %owner_id, "analysis deleted");
    Ok(())
}
