use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AnalyzeRequest, AnalyzeResponse, MessageResponse},
    repo_types::AnalysisWithFile,
    services::{self, BuildRequest},
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze))
        .route("/history", get(list_history))
        .route("/analysis/:id", delete(delete_analysis))
}

/// POST /analyze
#[instrument(skip_all, fields(user_id = %subject.user_id))]
pub async fn analyze(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let Json(payload) = payload?;
    let req = BuildRequest::try_from(payload)?;
    let analysis = services::build(&state, subject.user_id, req).await?;

    Ok(Json(AnalyzeResponse {
        analysis_id: analysis.id,
        chart_data: analysis.chart_data,
        chart_kind: analysis.chart_kind,
        title: analysis.title,
        x_column: analysis.x_column,
        y_column: analysis.y_column,
    }))
}

#[instrument(skip_all, fields(user_id = %subject.user_id))]
pub async fn list_history(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
) -> AppResult<Json<Vec<AnalysisWithFile>>> {
    Ok(Json(services::history(&state, subject.user_id).await?))
}

/// DELETE /analysis/:id
#[instrument(skip_all, fields(user_id = %subject.user_id, analysis_id = %id))]
pub async fn delete_analysis(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let analysis_id = Uuid::parse_str(&id).map_err(|_| AppError::NotFound("Analysis"))?;
    services::delete(&state, subject.user_id, analysis_id).await?;
    Ok(Json(MessageResponse {
        message: "Analysis deleted successfully",
    }))
}
