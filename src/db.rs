use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

/// Opens the pool and applies pending migrations.
pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("connect to database")?;

    match sqlx::migrate!("./migrations").run(&pool).await {
        Ok(()) => info!("migrations applied"),
        Err(e) => warn!(error = %e, "migration failed; continuing"),
    }
    Ok(pool)
}

#[cfg(test)]
mod tests {
    const INIT: &str = include_str!("../migrations/0001_init.sql");

    #[test]
    fn analyses_do_not_reference_files_in_schema() {
        let analyses = INIT
            .split("CREATE TABLE")
            .find(|t| t.trim_start().starts_with("IF NOT EXISTS analyses"))
            .unwrap();
        assert!(!analyses.contains("REFERENCES uploaded_files"));
        assert!(analyses.contains("file_id     UUID NOT NULL,"));
    }
}
