use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::UsageStats, services};
use crate::{
    auth::{repo_types::User, AdminUser},
    error::AppResult,
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/usage", get(usage))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(services::list_users(&state).await?))
}

#[instrument(skip_all, fields(admin_id = %admin.user_id))]
pub async fn usage(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> AppResult<Json<UsageStats>> {
    Ok(Json(services::usage_stats(&state).await?))
}
