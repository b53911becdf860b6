//! # Row Stores
//!
//! The seam between the generic repository facade and a concrete storage
//! engine.
//!
//! ## The Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RowStore trait                                   │
//! │                                                                         │
//! │  Repository (facade)                                                   │
//! │       │  Query  { table, [Eq(col, v) | In(col, [v..])] }               │
//! │       │  WriteOp{ Insert | Update | Delete | Nullify }                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────┐   ┌───────────────────────────┐         │
//! │  │       SqliteStore         │   │       MemoryStore         │         │
//! │  │  sqlx + SqlitePool        │   │  tokio RwLock<tables>     │         │
//! │  │  atomic = transaction     │   │  atomic = copy & swap     │         │
//! │  └───────────────────────────┘   └───────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rules Every Store Follows
//! - Rows come back ordered by `id`, and always carry the `id` column
//! - Values are compared and stored in their normalized form
//!   ([`Value::normalized`]); an `Eq` filter on `NULL` means `IS NULL`
//! - `execute_atomic` applies every operation or none of them
//!
//! ## Where Stores Differ
//! Constraints are the engine's business. [`SqliteStore`] enforces the
//! schema's foreign keys, uniqueness and NOT NULL columns; [`MemoryStore`]
//! enforces none of them. Deleting a row that is still referenced fails with
//! [`DbError::ForeignKeyViolation`](crate::DbError::ForeignKeyViolation) on
//! SQLite and succeeds on the memory store, leaving the reference dangling.
//! Callers that must behave the same on both disconnect dependents first
//! (`Repository::disconnect_and_delete`).

use async_trait::async_trait;
use sparks_core::{Row, Value};

use crate::error::DbResult;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

// =============================================================================
// Queries
// =============================================================================

/// One predicate of a [`Query`]. All predicates of a query must hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`, or `column IS NULL` for [`Value::Null`].
    Eq(&'static str, Value),
    /// `column IN (values..)`. An empty list matches nothing.
    In(&'static str, Vec<Value>),
}

impl Filter {
    /// Evaluates the predicate against a stored row.
    pub fn matches(&self, row: &Row) -> bool {
        let stored = |column: &str| row.get(column).cloned().unwrap_or(Value::Null);
        match self {
            Filter::Eq(column, value) => stored(column).matches(value),
            Filter::In(column, values) => {
                let stored = stored(column);
                values.iter().any(|v| !v.is_null() && stored.matches(v))
            }
        }
    }
}

/// A selection of whole rows from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: &'static str,
    pub filters: Vec<Filter>,
}

impl Query {
    /// Selects every row of `table`.
    pub fn table(table: &'static str) -> Self {
        Query {
            table,
            filters: Vec::new(),
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(column, value.into()));
        self
    }

    pub fn any_of(mut self, column: &'static str, values: Vec<Value>) -> Self {
        self.filters.push(Filter::In(column, values));
        self
    }

    /// Whether the query can match nothing regardless of the data.
    pub fn is_empty_selection(&self) -> bool {
        self.filters
            .iter()
            .any(|f| matches!(f, Filter::In(_, values) if values.is_empty()))
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}

// =============================================================================
// Writes
// =============================================================================

/// A single mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Adds a row; the store assigns its `id`.
    Insert { table: &'static str, row: Row },
    /// Overwrites the given columns of the row with this `id`.
    Update {
        table: &'static str,
        id: i64,
        row: Row,
    },
    Delete { table: &'static str, id: i64 },
    /// Sets `column` to NULL on every row where it equals `target_id`.
    Nullify {
        table: &'static str,
        column: &'static str,
        target_id: i64,
    },
}

impl WriteOp {
    pub fn table(&self) -> &'static str {
        match self {
            WriteOp::Insert { table, .. }
            | WriteOp::Update { table, .. }
            | WriteOp::Delete { table, .. }
            | WriteOp::Nullify { table, .. } => table,
        }
    }

    /// Short verb, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            WriteOp::Insert { .. } => "insert",
            WriteOp::Update { .. } => "update",
            WriteOp::Delete { .. } => "delete",
            WriteOp::Nullify { .. } => "nullify",
        }
    }
}

/// What a write did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteResult {
    pub rows_affected: u64,
    /// Set by inserts only.
    pub last_insert_id: Option<i64>,
}

// =============================================================================
// The Trait
// =============================================================================

/// A storage engine the repository facade can drive.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Rows of `query.table` matching every filter, ordered by `id`.
    async fn query(&self, query: &Query) -> DbResult<Vec<Row>>;

    async fn execute(&self, op: WriteOp) -> DbResult<WriteResult>;

    /// Applies `ops` in order as one unit: all of them or none.
    async fn execute_atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteResult>>;

    async fn health_check(&self) -> bool;

    /// Releases the store. Later calls fail with a connection error.
    async fn close(&self);
}
