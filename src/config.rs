use std::path::PathBuf;

use serde::Deserialize;

/// Secret used when `JWT_SECRET` is not configured.
pub const FALLBACK_JWT_SECRET: &str = "your-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Where users, files and analyses are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub backend: DataBackend,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub admin_email: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let backend = match get("DATA_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => DataBackend::Postgres,
            Some("memory") => DataBackend::Memory,
            Some(other) => anyhow::bail!("unknown DATA_BACKEND `{other}`"),
        };

        let database_url = get("DATABASE_URL");
        if backend == DataBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when DATA_BACKEND=postgres");
        }

        let secret = match get("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; falling back to the built-in secret");
                FALLBACK_JWT_SECRET.to_string()
            }
        };

        let jwt = JwtConfig {
            secret,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "sheetcharts".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "sheetcharts-users".into()),
            ttl_minutes: get("JWT_TTL_MINUTES")
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60 * 24),
        };

        Ok(Self {
            backend,
            database_url,
            jwt,
            upload_dir: get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(10 * 1024 * 1024),
            admin_email: get("ADMIN_EMAIL")
                .map(|e| e.trim().to_lowercase())
                .unwrap_or_else(|| "admin@excel.com".into()),
        })
    }
}
