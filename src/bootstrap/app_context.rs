use std::sync::Arc;

use crate::application::ports::document_repository::DocumentRepository;
use crate::bootstrap::config::{Config, StorageBackend};
use crate::infrastructure::db::repositories::document_repository_memory::InMemoryDocumentRepository;
use crate::infrastructure::db::repositories::document_repository_sqlx::SqlxDocumentRepository;

#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

#[derive(Clone)]
pub struct AppServices {
    document_repo: Arc<dyn DocumentRepository>,
}

impl AppServices {
    pub fn new(document_repo: Arc<dyn DocumentRepository>) -> Self {
        Self { document_repo }
    }

    /// Wires the repository for the configured backend, preparing the schema
    /// of relational stores once.
    pub async fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let document_repo: Arc<dyn DocumentRepository> = match cfg.storage_backend.dialect() {
            None => Arc::new(InMemoryDocumentRepository::new()),
            Some(dialect) => {
                let pool = crate::infrastructure::db::connect_pool(
                    &cfg.database_url,
                    cfg.database_max_connections,
                )
                .await?;
                crate::infrastructure::db::migrate(&pool, dialect).await?;
                Arc::new(SqlxDocumentRepository::new(pool))
            }
        };
        tracing::info!(backend = ?cfg.storage_backend, "storage_ready");
        Ok(Self::new(document_repo))
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn document_repo(&self) -> Arc<dyn DocumentRepository> {
        self.services.document_repo.clone()
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.cfg.storage_backend
    }
}
