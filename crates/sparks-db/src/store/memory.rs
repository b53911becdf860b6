//! # In-Memory Row Store
//!
//! A [`RowStore`] holding every table in process memory.
//!
//! Used by tests and by tools that need the repository without a database
//! file. It follows the same ordering and normalization rules as
//! [`SqliteStore`](super::SqliteStore) but enforces no constraints: no
//! foreign keys, no uniqueness, no NOT NULL.
//!
//! ## Atomic Units
//! ```text
//! execute_atomic([op1, op2, op3])
//!      │
//!      ├── write lock
//!      ├── clone tables ──► apply op1, op2, op3 to the clone
//!      │                          │
//!      │            any failure ──┴──► drop clone, tables untouched
//!      └── swap clone in
//! ```

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use sparks_core::{Row, Value, ID_COLUMN};

use super::{Query, RowStore, WriteOp, WriteResult};
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone, Default)]
struct Table {
    rows: BTreeMap<i64, Row>,
    last_id: i64,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<&'static str, Table>,
    closed: bool,
}

impl State {
    fn ensure_open(&self) -> DbResult<()> {
        if self.closed {
            return Err(DbError::ConnectionFailed("store is closed".to_string()));
        }
        Ok(())
    }
}

/// Process-memory [`RowStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Number of rows currently stored in `table`.
    pub async fn row_count(&self, table: &str) -> usize {
        self.state
            .read()
            .await
            .tables
            .get(table)
            .map_or(0, |t| t.rows.len())
    }
}

fn apply(tables: &mut HashMap<&'static str, Table>, op: WriteOp) -> WriteResult {
    match op {
        WriteOp::Insert { table, row } => {
            let table = tables.entry(table).or_default();
            table.last_id += 1;
            let id = table.last_id;
            let row = row.normalized().with(ID_COLUMN, id);
            table.rows.insert(id, row);
            WriteResult {
                rows_affected: 1,
                last_insert_id: Some(id),
            }
        }
        WriteOp::Update { table, id, row } => {
            let stored = tables.get_mut(table).and_then(|t| t.rows.get_mut(&id));
            match stored {
                Some(stored) => {
                    for (column, value) in row.normalized().iter() {
                        if column != ID_COLUMN {
                            stored.set(column, value.clone());
                        }
                    }
                    WriteResult {
                        rows_affected: 1,
                        last_insert_id: None,
                    }
                }
                None => WriteResult::default(),
            }
        }
        WriteOp::Delete { table, id } => {
            let removed = tables
                .get_mut(table)
                .and_then(|t| t.rows.remove(&id))
                .is_some();
            WriteResult {
                rows_affected: u64::from(removed),
                last_insert_id: None,
            }
        }
        WriteOp::Nullify {
            table,
            column,
            target_id,
        } => {
            let target = Value::Integer(target_id);
            let mut affected = 0;
            if let Some(table) = tables.get_mut(table) {
                for row in table.rows.values_mut() {
                    if row.get(column).is_some_and(|v| v.matches(&target)) {
                        row.set(column, Value::Null);
                        affected += 1;
                    }
                }
            }
            WriteResult {
                rows_affected: affected,
                last_insert_id: None,
            }
        }
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn query(&self, query: &Query) -> DbResult<Vec<Row>> {
        let state = self.state.read().await;
        state.ensure_open()?;

        let rows = state
            .tables
            .get(query.table)
            .map(|t| {
                t.rows
                    .values()
                    .filter(|row| query.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }

    async fn execute(&self, op: WriteOp) -> DbResult<WriteResult> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        debug!(op = op.kind(), table = op.table(), "Memory write");
        Ok(apply(&mut state.tables, op))
    }

    async fn execute_atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteResult>> {
        let mut state = self.state.write().await;
        state.ensure_open()?;

        let mut scratch = state.tables.clone();
        let results = ops.into_iter().map(|op| apply(&mut scratch, op)).collect();
        state.tables = scratch;
        Ok(results)
    }

    async fn health_check(&self) -> bool {
        !self.state.read().await.closed
    }

    async fn close(&self) {
        self.state.write().await.closed = true;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
