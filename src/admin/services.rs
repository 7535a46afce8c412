use tracing::debug;

use super::dto::{RecentUser, UsageStats};
use crate::{auth::repo_types::User, error::AppResult, state::AppState};

const RECENT_USERS: usize = 5;

pub async fn list_users(state: &AppState) -> AppResult<Vec<User>> {
    Ok(state.users.list().await?)
}

/// Counts across every user, plus the latest registrations.
pub async fn usage_stats(state: &AppState) -> AppResult<UsageStats> {
    let stats = UsageStats {
        total_users: state.users.count().await?,
        total_files: state.files.count().await?,
        total_analyses: state.analyses.count().await?,
        total_storage_bytes: state.files.total_size().await?,
        recent_users: state
            .users
            .recent(RECENT_USERS)
            .await?
            .into_iter()
            .map(RecentUser::from)
            .collect(),
    };
    debug!(
        users = stats.total_users,
        files = stats.total_files,
        analyses = stats.total_analyses,
        "usage computed"
    );
    Ok(stats)
}
