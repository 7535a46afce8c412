use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUploadedFile, UploadedFile};

/// File registry.
#[async_trait]
pub trait FileRepo: Send + Sync {
    async fn register(&self, new: NewUploadedFile) -> anyhow::Result<UploadedFile>;
    /// Newest upload first.
    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<UploadedFile>>;
    /// `None` both when the file is absent and when someone else owns it.
    async fn get(&self, file_id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<UploadedFile>>;
    async fn get_many(&self, file_ids: &[Uuid]) -> anyhow::Result<Vec<UploadedFile>>;
    /// Appends to the back-reference list. Calling twice links twice.
    async fn link_analysis(&self, file_id: Uuid, analysis_id: Uuid) -> anyhow::Result<()>;
    async fn count(&self) -> anyhow::Result<i64>;
    async fn total_size(&self) -> anyhow::Result<i64>;
}

pub struct PgFileRepo {
    db: PgPool,
}

impl PgFileRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const FILE_COLUMNS: &str = "id, user_id, filename, original_name, path, headers, row_count, \
                            file_size, uploaded_at, analysis_ids";

#[async_trait]
impl FileRepo for PgFileRepo {
    async fn register(&self, new: NewUploadedFile) -> anyhow::Result<UploadedFile> {
        let file = sqlx::query_as::<_, UploadedFile>(&format!(
            r#"
            INSERT INTO uploaded_files
                (user_id, filename, original_name, path, headers, row_count, file_size)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILE_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(&new.filename)
        .bind(&new.original_name)
        .bind(&new.path)
        .bind(&new.headers)
        .bind(new.row_count)
        .bind(new.file_size)
        .fetch_one(&self.db)
        .await
        .context("insert uploaded file")?;
        Ok(file)
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<UploadedFile>> {
        let files = sqlx::query_as::<_, UploadedFile>(&format!(
            r#"
            SELECT {FILE_COLUMNS}
              FROM uploaded_files
             WHERE user_id = $1
             ORDER BY uploaded_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list uploaded files")?;
        Ok(files)
    }

    async fn get(&self, file_id: Uuid, owner_id: Uuid) -> anyhow::Result<Option<UploadedFile>> {
        let file = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = $1 AND user_id = $2"
        ))
        .bind(file_id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("get uploaded file")?;
        Ok(file)
    }

    async fn get_many(&self, file_ids: &[Uuid]) -> anyhow::Result<Vec<UploadedFile>> {
        let files = sqlx::query_as::<_, UploadedFile>(&format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = ANY($1)"
        ))
        .bind(file_ids)
        .fetch_all(&self.db)
        .await
        .context("get uploaded files")?;
        Ok(files)
    }

    async fn link_analysis(&self, file_id: Uuid, analysis_id: Uuid) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE uploaded_files
               SET analysis_ids = array_append(analysis_ids, $2)
             WHERE id = $1
            "#,
        )
        .bind(file_id)
        .bind(analysis_id)
        .execute(&self.db)
        .await
        .context("link analysis to file")?;
        Ok(())
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM uploaded_files")
            .fetch_one(&self.db)
            .await
            .context("count uploaded files")?;
        Ok(n)
    }

    async fn total_size(&self) -> anyhow::Result<i64> {
        let (n,): (i64,) =
            sqlx::query_as("SELECT COALESCE(SUM(file_size), 0)::BIGINT FROM uploaded_files")
                .fetch_one(&self.db)
                .await
                .context("sum uploaded file sizes")?;
        Ok(n)
    }
}
