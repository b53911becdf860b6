//! # Sparks Back Office Library
//!
//! Business services of the back office and the wiring that runs them.
//!
//! ## Module Organization
//! ```text
//! sparks_backoffice/
//! ├── lib.rs          ◄─── You are here (startup & logging)
//! ├── config.rs       ◄─── Defaults, JSON file, SPARKS_* variables
//! ├── context.rs      ◄─── Registry wiring (repository, audit, session)
//! ├── error.rs        ◄─── AppError for service results
//! └── services/
//!     ├── login.rs      ◄─── Sign in / sign out
//!     ├── inventory.rs  ◄─── Items, categories, suppliers, clients
//!     └── arrival.rs    ◄─── Arrival goods and invoices
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod services;

pub use config::{AppConfig, ConfigError};
pub use context::AppContext;
pub use error::{AppError, AppResult, ErrorCode};

use sparks_core::{Employee, Item};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Starts the back office and reports whether storage is usable.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Back Office Startup                               │
/// │                                                                         │
/// │  1. Load Configuration ───────────────────────────────────────────────► │
/// │     • defaults, SPARKS_CONFIG file, SPARKS_* variables                  │
/// │                                                                         │
/// │  2. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter                                │
/// │     • RUST_LOG wins over the configured filter                          │
/// │                                                                         │
/// │  3. Connect to Database ──────────────────────────────────────────────► │
/// │     • SQLite with WAL mode                                              │
/// │     • Run pending migrations                                            │
/// │                                                                         │
/// │  4. Bind Registry ────────────────────────────────────────────────────► │
/// │     • Repository, AuditLog, signed-out session                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> AppResult<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.log);

    info!("Starting Sparks Back Office");
    let context = AppContext::connect(&config).await?;

    let repository = context.repository();
    if !repository.health_check().await {
        return Err(AppError::new(ErrorCode::DatabaseError, "Database is not reachable"));
    }

    let employees = repository.find_all::<Employee>().await?.into_value().len();
    let items = repository.find_all::<Item>().await?.into_value().len();
    if employees == 0 {
        warn!("No employee accounts yet; run sparks-seed to create a manager");
    }
    info!(employees, items, "Back office ready");

    context.close().await;
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=sparks=trace` - Show trace for sparks crates only
/// - Default: `default_filter` (from configuration)
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
