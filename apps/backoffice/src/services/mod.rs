//! # Business Services
//!
//! ```text
//! services/
//! ├── login.rs      ◄─── Sign in / sign out, password hashing
//! ├── inventory.rs  ◄─── Items, categories, suppliers, clients
//! └── arrival.rs    ◄─── Arrival documents, invoices, stock intake
//! ```
//!
//! Every service is built from the registry of an
//! [`AppContext`](crate::context::AppContext) and shares its repository,
//! audit log and session slot.

pub mod arrival;
pub mod inventory;
pub mod login;

pub use arrival::{ArrivalGoodsService, ArrivalLine, ItemIntake};
pub use inventory::{InventoryService, ItemDraft};
pub use login::{hash_password, Argon2Verifier, LoginService, PasswordVerifier};

use tracing::warn;

use sparks_db::AuditLog;

use crate::error::AppResult;

/// Passes `result` through, writing a best-effort audit entry when it failed.
pub(crate) async fn audit_failure<T>(
    audit: &AuditLog,
    action: &str,
    detail: impl FnOnce() -> String,
    result: AppResult<T>,
) -> AppResult<T> {
    if let Err(err) = &result {
        let detail = detail();
        warn!(action, detail = %detail, error = %err, "Operation failed");
        audit
            .record(action, &format!("{}: {}", detail, err.message))
            .await;
    }
    result
}
