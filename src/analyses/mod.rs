pub mod chart;
mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::AnalysisRepo;

pub fn router() -> Router<AppState> {
    handlers::analysis_routes()
}
