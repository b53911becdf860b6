//! Shared fixtures for the back office suites.

#![allow(dead_code)]

use std::sync::Arc;

use sparks_backoffice::AppContext;
use sparks_db::{Database, DbConfig, MemoryStore, Repository};

/// A context over a fresh, migrated in-memory SQLite database.
pub async fn sqlite_context() -> AppContext {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    AppContext::from_repository(db.repository())
}

pub fn memory_context() -> AppContext {
    AppContext::from_repository(Repository::new(Arc::new(MemoryStore::new())))
}
