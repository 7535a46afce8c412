use serde::Serialize;
use time::OffsetDateTime;

use crate::auth::repo_types::User;

/// Summary returned by `GET /admin/usage`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub total_users: i64,
    pub total_files: i64,
    pub total_analyses: i64,
    pub total_storage_bytes: i64,
    pub recent_users: Vec<RecentUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUser {
    pub name: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for RecentUser {
    fn from(u: User) -> Self {
        Self {
            name: u.name,
            email: u.email,
            created_at: u.created_at,
        }
    }
}
