//! Process-local persistence for `DATA_BACKEND=memory` and tests.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    analyses::{
        repo_types::{Analysis, NewAnalysis},
        AnalysisRepo,
    },
    auth::{
        repo::UserRepo,
        repo_types::{DuplicateEmail, NewUser, User},
    },
    files::{repo_types::NewUploadedFile, FileRepo, UploadedFile},
};

/// All three registries behind one set of locks. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    files: RwLock<Vec<UploadedFile>>,
    analyses: RwLock<Vec<Analysis>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first; records sharing a timestamp keep newest-inserted first.
fn newest_first<T: Clone>(
    items: impl DoubleEndedIterator<Item = T>,
    at: impl Fn(&T) -> OffsetDateTime,
) -> Vec<T> {
    let mut out: Vec<T> = items.rev().collect();
    out.sort_by(|a, b| at(b).cmp(&at(a)));
    out
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new.email) {
            return Err(DuplicateEmail.into());
        }
        let user = User {
            id: Uuid::new_v4(),
            email: new.email,
            name: new.name,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let mut users = self.users.read().await.clone();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn recent(&self, limit: usize) -> anyhow::Result<Vec<User>> {
        let users = self.users.read().await;
        let mut recent = newest_first(users.iter().cloned(), |u| u.created_at);
        recent.truncate(limit);
        Ok(recent)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.users.read().await.len() as i64)
    }
}

#[async_trait]
impl FileRepo for MemoryStore {
    async fn register(&self, new: NewUploadedFile) -> anyhow::Result<UploadedFile> {
        let file = UploadedFile {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            filename: new.filename,
            original_name: new.original_name,
            path: new.path,
            headers: new.headers,
            row_count: new.row_count,
            file_size: new.file_size,
            uploaded_at: OffsetDateTime::now_utc(),
            analysis_ids: Vec::new(),
        };
        self.files.write().await.push(file.clone());
        Ok(file)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<UploadedFile>> {
        let files = self.files.read().await;
        Ok(newest_first(
            files.iter().filter(|f| f.user_id == owner_id).cloned(),
            |f| f.uploaded_at,
        ))
    }

    async fn get(&self, file_id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<UploadedFile>> {
        let files = self.files.read().await;
        Ok(files
            .iter()
            .find(|f| f.id == file_id && f.user_id == owner_id)
            .cloned())
    }

    async fn get_many(&self, file_ids: &[Uuid]) -> anyhow::Result<Vec<UploadedFile>> {
        let files = self.files.read().await;
        Ok(files
            .iter()
            .filter(|f| file_ids.contains(&f.id))
            .cloned()
            .collect())
    }

    async fn link_analysis(&self, file_id: Uuid, analysis_id: Uuid) -> anyhow::Result<()> {
        let mut files = self.files.write().await;
        if let Some(file) = files.iter_mut().find(|f| f.id == file_id) {
            file.analysis_ids.push(analysis_id);
        }
        Ok(())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.files.read().await.len() as i64)
    }

    async fn total_size(&self) -> anyhow::Result<i64> {
        Ok(self.files.read().await.iter().map(|f| f.file_size).sum())
    }
}

#[async_trait]
impl AnalysisRepo for MemoryStore {
    async fn create(&self, new: NewAnalysis) -> anyhow::Result<Analysis> {
        let analysis = Analysis {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            file_id: new.file_id,
            chart_kind: new.chart_kind,
            x_column: new.x_column,
            y_column: new.y_column,
            title: new.title,
            chart_data: new.chart_data,
            created_at: OffsetDateTime::now_utc(),
        };
        self.analyses.write().await.push(analysis.clone());
        Ok(analysis)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Analysis>> {
        let analyses = self.analyses.read().await;
        Ok(newest_first(
            analyses.iter().filter(|a| a.user_id == owner_id).cloned(),
            |a| a.created_at,
        ))
    }

    async fn delete(&self, analysis_id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let mut analyses = self.analyses.write().await;
        let before = analyses.len();
        analyses.retain(|a| !(a.id == analysis_id && a.user_id == owner_id));
        Ok(analyses.len() < before)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        Ok(self.analyses.read().await.len() as i64)
    }
}
