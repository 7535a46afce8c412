use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::UploadResponse,
    repo_types::UploadedFile,
    services::{self, Upload},
};
use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    state::AppState,
};

/// Headroom for multipart framing on top of the file ceiling.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn file_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/files", get(list_files))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation("File too large".into())
    } else {
        AppError::Validation(e.body_text())
    }
}

/// POST /upload (multipart, field `file`)
#[instrument(skip_all, fields(user_id = %subject.user_id))]
pub async fn upload_file(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut mp = multipart.map_err(|_| AppError::NoFile)?;

    let mut upload = None;
    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field.file_name().unwrap_or_default().to_string();
        let body = field.bytes().await.map_err(multipart_error)?;
        upload = Some(Upload {
            original_name,
            body,
        });
        break;
    }
    let upload = upload.ok_or(AppError::NoFile)?;

    let res = services::ingest(&state, subject.user_id, upload).await?;
    Ok(Json(res))
}

#[instrument(skip_all, fields(user_id = %subject.user_id))]
pub async fn list_files(
    State(state): State<AppState>,
    AuthUser(subject): AuthUser,
) -> AppResult<Json<Vec<UploadedFile>>> {
    Ok(Json(state.files.list_for_owner(subject.user_id).await?))
}
