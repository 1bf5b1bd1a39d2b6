use std::sync::Arc;

use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::config::{AppConfig, StorageConfig};
use crate::storage::{ObjectStore, S3Store};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = SqlitePoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let storage =
            Arc::new(S3Store::connect(&config.storage).await?) as Arc<dyn ObjectStore>;

        Ok(Self {
            db,
            config,
            storage,
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
        }
    }

    /// In-memory state for tests: single-connection sqlite pool (an in-memory
    /// database exists per connection) with migrations applied, and an object
    /// store that accepts everything.
    pub async fn fake() -> anyhow::Result<Self> {
        use axum::async_trait;
        use bytes::Bytes;

        struct FakeStore;
        #[async_trait]
        impl ObjectStore for FakeStore {
            async fn put_object(&self, _k: &str, _b: Bytes, _ct: &str) -> anyhow::Result<()> {
                Ok(())
            }
            async fn delete_object(&self, _k: &str) -> anyhow::Result<()> {
                Ok(())
            }
            async fn presign_get(&self, k: &str, _s: u64) -> anyhow::Result<String> {
                Ok(format!("https://fake.local/{}", k))
            }
        }

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            backup_api_url: Some("https://backup.example.com/api".into()),
            max_active_markers: 3,
            storage: StorageConfig {
                endpoint: "fake".into(),
                bucket: "fake".into(),
                access_key: "fake".into(),
                secret_key: "fake".into(),
                region: "us-east-1".into(),
            },
        });

        let storage = Arc::new(FakeStore) as Arc<dyn ObjectStore>;
        Ok(Self {
            db,
            config,
            storage,
        })
    }
}
