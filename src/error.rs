use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::spreadsheet::SheetError;

/// Failures of the access gate and of credential checks.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Admin access required")]
    Forbidden,
    #[error("Invalid credentials")]
    InvalidCredentials,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Validation(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("No file uploaded")]
    NoFile,

    #[error("Excel file is empty")]
    EmptyFile,

    #[error("Selected columns not found in data")]
    InvalidColumns,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::MissingToken | AuthError::InvalidCredentials) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Auth(AuthError::InvalidToken | AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Validation(_)
            | AppError::MissingFields
            | AppError::NoFile
            | AppError::EmptyFile
            | AppError::InvalidColumns => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SheetError> for AppError {
    fn from(err: SheetError) -> Self {
        match err {
            SheetError::Empty => AppError::EmptyFile,
            SheetError::Unreadable(e) => {
                AppError::Validation(format!("Unable to read spreadsheet: {e}"))
            }
        }
    }
}

/// Malformed JSON bodies answer with the usual `{message}` body instead of
/// axum's plain-text rejection.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::MissingFields,
            other => AppError::Validation(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(e) => {
                tracing::error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorBody { message })).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
