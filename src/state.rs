use std::sync::Arc;

use tracing::info;

use crate::{
    analyses::{repo::PgAnalysisRepo, AnalysisRepo},
    auth::{repo::PgUserRepo, repo::UserRepo, JwtKeys},
    config::{AppConfig, DataBackend},
    db,
    files::{repo::PgFileRepo, FileRepo},
    memory::MemoryStore,
    storage::{LocalStorage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub files: Arc<dyn FileRepo>,
    pub analyses: Arc<dyn AnalysisRepo>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        let local = LocalStorage::new(&config.upload_dir).await?;
        info!(root = %local.root().display(), "upload storage ready");
        let storage = Arc::new(local) as Arc<dyn StorageClient>;

        let state = match (config.backend, config.database_url.as_deref()) {
            (DataBackend::Postgres, Some(url)) => {
                let pool = db::connect(url).await?;
                Self {
                    jwt: JwtKeys::new(&config.jwt),
                    users: Arc::new(PgUserRepo::new(pool.clone())),
                    files: Arc::new(PgFileRepo::new(pool.clone())),
                    analyses: Arc::new(PgAnalysisRepo::new(pool)),
                    storage,
                    config: Arc::new(config),
                }
            }
            (DataBackend::Postgres, None) => {
                anyhow::bail!("DATABASE_URL is required when DATA_BACKEND=postgres")
            }
            (DataBackend::Memory, _) => {
                info!("using in-memory store; data is lost on restart");
                Self::in_memory(config, storage)
            }
        };
        Ok(state)
    }

    pub fn in_memory(config: AppConfig, storage: Arc<dyn StorageClient>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            jwt: JwtKeys::new(&config.jwt),
            users: store.clone(),
            files: store.clone(),
            analyses: store,
            storage,
            config: Arc::new(config),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use std::{collections::HashMap, path::PathBuf, sync::Mutex};

        use anyhow::Context;
        use async_trait::async_trait;
        use bytes::Bytes;

        #[derive(Default)]
        struct FakeStorage {
            objects: Mutex<HashMap<String, Bytes>>,
        }

        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(&self, key: &str, body: Bytes) -> anyhow::Result<String> {
                let location = format!("fake://{key}");
                self.objects.lock().unwrap().insert(location.clone(), body);
                Ok(location)
            }
            async fn get_object(&self, location: &str) -> anyhow::Result<Bytes> {
                self.objects
                    .lock()
                    .unwrap()
                    .get(location)
                    .cloned()
                    .with_context(|| format!("no object at {location}"))
            }
            async fn delete_object(&self, location: &str) -> anyhow::Result<()> {
                self.objects.lock().unwrap().remove(location);
                Ok(())
            }
        }

        let config = AppConfig {
            backend: DataBackend::Memory,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 60 * 24,
            },
            upload_dir: PathBuf::from("unused"),
            max_upload_bytes: 10 * 1024 * 1024,
            admin_email: "admin@excel.com".into(),
        };
        Self::in_memory(config, Arc::new(FakeStorage::default()))
    }
}
