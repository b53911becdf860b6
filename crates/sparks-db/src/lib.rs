//! # sparks-db: Storage Layer for the Sparks Back Office
//!
//! Storage access for every entity through one generic facade.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sparks Back Office Data Flow                       │
//! │                                                                         │
//! │  InventoryService::delete_item(7)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sparks-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  Repository   │    │   RowStore    │    │  Migrations  │  │   │
//! │  │   │ (facade)      │───►│ SqliteStore   │    │  (embedded)  │  │   │
//! │  │   │ find / upsert │    │ MemoryStore   │    │ 001_init.sql │  │   │
//! │  │   │ cascade       │    └───────────────┘    └──────────────┘  │   │
//! │  │   └───────▲───────┘                                            │   │
//! │  │           │              ┌───────────────┐                     │   │
//! │  │           └──────────────│   AuditLog    │                     │   │
//! │  │                          └───────────────┘                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   <platform data dir>/sparks.db                                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`store`] - The `RowStore` trait and its SQLite and in-memory engines
//! - [`repository`] - The generic persistence facade
//! - [`audit`] - The employee audit log
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sparks_core::{Employee, Outcome};
//! use sparks_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/sparks.db")).await?;
//! let repo = db.repository();
//!
//! let outcome = repo.find_one_by_field(Employee::EMAIL, "a@x.com").await?;
//! if let Some(employee) = outcome.into_option() {
//!     // ...
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use audit::AuditLog;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::Repository;
pub use store::{MemoryStore, RowStore, SqliteStore};
