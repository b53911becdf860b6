//! # Audit Log
//!
//! Append-only record of what employees did, attributed to whoever the
//! registry holds as the current session.
//!
//! ## Failure Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service: delete item #7 ──► fails ──► audit.record("Delete Item", ..) │
//! │                                              │                          │
//! │                                   write fails too?                      │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                            tracing::warn!  and carry on                 │
//! │                                                                         │
//! │  The service still reports ITS OWN result; an audit failure never      │
//! │  replaces or masks it.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Callers that need to observe the write use [`AuditLog::try_record`].

use std::sync::Arc;

use tracing::{debug, warn};

use sparks_core::{CurrentEmployee, Employee, EmployeeLog, Registry};

use crate::error::DbResult;
use crate::repository::Repository;

/// Writes [`EmployeeLog`] entries through the repository facade.
#[derive(Debug, Clone)]
pub struct AuditLog {
    repository: Repository,
    registry: Arc<Registry>,
}

impl AuditLog {
    /// `registry` is consulted on every write for the [`CurrentEmployee`].
    pub fn new(repository: Repository, registry: Arc<Registry>) -> Self {
        AuditLog {
            repository,
            registry,
        }
    }

    /// Appends an entry. Failures are logged and discarded.
    pub async fn record(&self, action: &str, detail: &str) {
        if let Err(err) = self.try_record(action, detail).await {
            warn!(action, error = %err, "Audit entry dropped");
        }
    }

    /// Appends an entry and returns its identity.
    pub async fn try_record(&self, action: &str, detail: &str) -> DbResult<i64> {
        let session = self.registry.get::<CurrentEmployee>();
        let mut entry = EmployeeLog::new(session.reference(), action, detail);
        let id = self.repository.upsert(&mut entry).await?;
        debug!(action, id, employee = ?entry.employee.id(), "Audit entry recorded");
        Ok(id)
    }

    /// Entries attributed to `employee`, oldest first.
    pub async fn entries_for(&self, employee: &Employee) -> DbResult<Vec<EmployeeLog>> {
        let Some(id) = employee.id else {
            return Ok(Vec::new());
        };
        let outcome = self
            .repository
            .find_all_by_field(EmployeeLog::EMPLOYEE, id)
            .await?;
        Ok(outcome.into_value())
    }

    /// Entries recorded while nobody was signed in.
    pub async fn anonymous_entries(&self) -> DbResult<Vec<EmployeeLog>> {
        let outcome = self
            .repository
            .find_all_by_field(EmployeeLog::EMPLOYEE, None::<i64>)
            .await?;
        Ok(outcome.into_value())
    }
}
