use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::repo_types::{Analysis, AnalysisRow, NewAnalysis};

/// Analysis registry.
#[async_trait]
pub trait AnalysisRepo: Send + Sync {
    async fn create(&self, new: NewAnalysis) -> anyhow::Result<Analysis>;
    /// Newest first.
    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Analysis>>;
    /// Returns `false` when nothing owned by `owner_id` had that id.
    async fn delete(&self, analysis_id: Uuid, owner_id: Uuid) -> anyhow::Result<bool>;
    async fn count(&self) -> anyhow::Result<i64>;
}

pub struct PgAnalysisRepo {
    db: PgPool,
}

impl PgAnalysisRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const ANALYSIS_COLUMNS: &str =
    "id, user_id, file_id, chart_kind, x_column, y_column, title, chart_data, created_at";

#[async_trait]
impl AnalysisRepo for PgAnalysisRepo {
    async fn create(&self, new: NewAnalysis) -> anyhow::Result<Analysis> {
        let row = sqlx::query_as::<_, AnalysisRow>(&format!(
            r#"
            INSERT INTO analyses
                (user_id, file_id, chart_kind, x_column, y_column, title, chart_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ANALYSIS_COLUMNS}
            "#
        ))
        .bind(new.user_id)
        .bind(new.file_id)
        .bind(new.chart_kind.as_str())
        .bind(&new.x_column)
        .bind(&new.y_column)
        .bind(&new.title)
        .bind(Json(&new.chart_data))
        .fetch_one(&self.db)
        .await
        .context("insert analysis")?;
        row.try_into()
    }

    async fn list_for_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Analysis>> {
        let rows = sqlx::query_as::<_, AnalysisRow>(&format!(
            r#"
            SELECT {ANALYSIS_COLUMNS}
              FROM analyses
             WHERE user_id = $1
             ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list analyses")?;
        rows.into_iter().map(Analysis::try_from).collect()
    }

    async fn delete(&self, analysis_id: Uuid, owner_id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM analyses WHERE id = $1 AND user_id = $2")
            .bind(analysis_id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .context("delete analysis")?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM analyses")
            .fetch_one(&self.db)
            .await
            .context("count analyses")?;
        Ok(n)
    }
}
