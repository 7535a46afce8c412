mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::FileRepo;
pub use repo_types::UploadedFile;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    handlers::file_routes(max_upload_bytes)
}
