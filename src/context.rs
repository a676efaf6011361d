/// Application context and dependency injection
use crate::{
    account::AccountManager,
    catalog::SqliteCatalog,
    config::ServerConfig,
    db,
    error::{VaultError, VaultResult},
    files::FileService,
    storage::{DiskJanitor, ZipArchiver},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub file_service: Arc<FileService>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> VaultResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        // Initialize database
        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let config = Arc::new(config);

        let account_manager = Arc::new(AccountManager::new(db.clone(), Arc::clone(&config)));

        let file_service = Arc::new(FileService::new(
            Arc::new(SqliteCatalog::new(db.clone())),
            Arc::new(ZipArchiver::new()),
            Arc::new(DiskJanitor::new(config.storage.upload_root.clone())),
            config.storage.namespace.clone(),
            config.ingest.timeout(),
        ));

        tracing::info!(
            "Uploads stored under {:?}/{}",
            config.storage.upload_root,
            config.storage.namespace
        );

        Ok(Self {
            config,
            db,
            account_manager,
            file_service,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> VaultResult<()> {
        let dirs = [
            config.storage.data_directory.clone(),
            config.storage.upload_root.join(&config.storage.namespace),
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    VaultError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
