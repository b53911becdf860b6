//! # Application Context
//!
//! Owns the registry every service reads its collaborators from.
//!
//! ## What Gets Bound
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Registry (one per context)                      │
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐   │
//! │  │   Repository     │ │    AuditLog      │ │  CurrentEmployee     │   │
//! │  │                  │ │                  │ │                      │   │
//! │  │  • facade over   │ │  • reads the     │ │  • signed_out at     │   │
//! │  │    the pool      │ │    session slot  │ │    startup           │   │
//! │  │                  │ │                  │ │  • rebound by login  │   │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘   │
//! │                                                                         │
//! │  Services are built from the context and share the same instances.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tests build an isolated context with [`AppContext::from_repository`], so
//! sessions never leak between them.

use std::sync::Arc;

use tracing::info;

use sparks_core::{CurrentEmployee, Registry};
use sparks_db::{AuditLog, Database, Repository};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::services::{ArrivalGoodsService, InventoryService, LoginService};

/// Explicit session context handed to every service.
#[derive(Debug, Clone)]
pub struct AppContext {
    registry: Arc<Registry>,
    database: Option<Database>,
}

impl AppContext {
    /// Opens the configured database, runs migrations and binds the
    /// infrastructure.
    pub async fn connect(config: &AppConfig) -> AppResult<Self> {
        if let Some(dir) = config.database_path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AppError::internal(format!(
                        "Cannot create data directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        let database = Database::new(config.db_config()).await?;
        let mut context = Self::from_repository(database.repository());
        context.database = Some(database);
        info!(path = %config.database_path.display(), "Back office context ready");
        Ok(context)
    }

    /// Binds `repository` into a fresh registry.
    pub fn from_repository(repository: Repository) -> Self {
        let registry = Arc::new(Registry::new());
        let repository = registry.rebind(repository);
        registry.rebind(AuditLog::new((*repository).clone(), registry.clone()));
        registry.rebind(CurrentEmployee::signed_out());
        AppContext {
            registry,
            database: None,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn repository(&self) -> Arc<Repository> {
        self.registry.require::<Repository>()
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        self.registry.require::<AuditLog>()
    }

    /// The session as of now; login and logout rebind it.
    pub fn current_employee(&self) -> Arc<CurrentEmployee> {
        self.registry.get::<CurrentEmployee>()
    }

    /// The underlying database, when this context opened one.
    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }

    pub fn login(&self) -> LoginService {
        LoginService::new(&self.registry)
    }

    pub fn inventory(&self) -> InventoryService {
        InventoryService::new(&self.registry)
    }

    pub fn arrival(&self) -> ArrivalGoodsService {
        ArrivalGoodsService::new(&self.registry)
    }

    pub async fn close(&self) {
        self.repository().close().await;
    }
}
