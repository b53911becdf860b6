//! # SQLite Row Store
//!
//! Runs repository queries against SQLite through sqlx.
//!
//! ## SQL Generation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Query::table("items").eq("category_id", 2)                            │
//! │     ──► SELECT * FROM "items" WHERE "category_id" = ?1 ORDER BY "id"   │
//! │                                                                         │
//! │  Query::table("items").eq("category_id", NULL)                         │
//! │     ──► SELECT * FROM "items" WHERE "category_id" IS NULL ORDER BY ..  │
//! │                                                                         │
//! │  WriteOp::Nullify { "nomenclature_details", "item_id", 7 }             │
//! │     ──► UPDATE "nomenclature_details" SET "item_id" = NULL             │
//! │         WHERE "item_id" = ?1                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Table and column names come from static entity schemas and are quoted;
//! every value is bound as a parameter in its normalized form.
//!
//! ## Reading Rows Back
//! Columns are decoded by the storage class SQLite reports for each value
//! (INTEGER, REAL, TEXT, BLOB, NULL), so no per-entity row struct is needed.

use async_trait::async_trait;
use sqlx::query::Query as SqlxQuery;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use tracing::{debug, warn};

use sparks_core::{Row, Value, ID_COLUMN};

use super::{Filter, Query, RowStore, WriteOp, WriteResult};
use crate::error::{DbError, DbResult};

type Statement<'q> = SqlxQuery<'q, Sqlite, SqliteArguments<'q>>;

/// [`RowStore`] over a sqlx SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RowStore for SqliteStore {
    async fn query(&self, query: &Query) -> DbResult<Vec<Row>> {
        if query.is_empty_selection() {
            return Ok(Vec::new());
        }

        let (sql, params) = select_sql(query);
        debug!(sql = %sql, "Executing select");

        let rows = bind_all(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, op: WriteOp) -> DbResult<WriteResult> {
        let mut conn = self.pool.acquire().await?;
        apply(&mut *conn, &op).await
    }

    async fn execute_atomic(&self, ops: Vec<WriteOp>) -> DbResult<Vec<WriteResult>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut results = Vec::with_capacity(ops.len());
        for op in &ops {
            match apply(&mut *tx, op).await {
                Ok(result) => results.push(result),
                Err(err) => {
                    warn!(op = op.kind(), table = op.table(), error = %err, "Rolling back atomic unit");
                    // Explicit, so a failed rollback gets logged.
                    if let Err(rollback) = tx.rollback().await {
                        warn!(error = %rollback, "Rollback failed");
                    }
                    return Err(err);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(results)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

// =============================================================================
// SQL Building
// =============================================================================

fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn select_sql(query: &Query) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT * FROM {}", ident(query.table));
    let mut params = Vec::new();
    let mut clauses = Vec::with_capacity(query.filters.len());

    for filter in &query.filters {
        match filter {
            Filter::Eq(column, Value::Null) => clauses.push(format!("{} IS NULL", ident(column))),
            Filter::Eq(column, value) => {
                params.push(value.clone());
                clauses.push(format!("{} = ?{}", ident(column), params.len()));
            }
            Filter::In(column, values) => {
                let mut slots = Vec::with_capacity(values.len());
                for value in values.iter().filter(|v| !v.is_null()) {
                    params.push(value.clone());
                    slots.push(format!("?{}", params.len()));
                }
                if slots.is_empty() {
                    clauses.push("0".to_string());
                } else {
                    clauses.push(format!("{} IN ({})", ident(column), slots.join(", ")));
                }
            }
        }
    }

    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {}", ident(ID_COLUMN)));
    (sql, params)
}

fn write_sql(op: &WriteOp) -> (String, Vec<Value>) {
    match op {
        WriteOp::Insert { table, row } => {
            if row.is_empty() {
                return (format!("INSERT INTO {} DEFAULT VALUES", ident(table)), Vec::new());
            }
            let columns: Vec<String> = row.iter().map(|(c, _)| ident(c)).collect();
            let slots: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let params = row.iter().map(|(_, v)| v.clone()).collect();
            (
                format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    ident(table),
                    columns.join(", "),
                    slots.join(", ")
                ),
                params,
            )
        }
        WriteOp::Update { table, id, row } => {
            let mut params: Vec<Value> = Vec::with_capacity(row.len() + 1);
            let mut sets = Vec::with_capacity(row.len());
            for (column, value) in row.iter().filter(|(c, _)| *c != ID_COLUMN) {
                params.push(value.clone());
                sets.push(format!("{} = ?{}", ident(column), params.len()));
            }
            if sets.is_empty() {
                // Still reports whether the row exists.
                sets.push(format!("{0} = {0}", ident(ID_COLUMN)));
            }
            params.push(Value::Integer(*id));
            (
                format!(
                    "UPDATE {} SET {} WHERE {} = ?{}",
                    ident(table),
                    sets.join(", "),
                    ident(ID_COLUMN),
                    params.len()
                ),
                params,
            )
        }
        WriteOp::Delete { table, id } => (
            format!("DELETE FROM {} WHERE {} = ?1", ident(table), ident(ID_COLUMN)),
            vec![Value::Integer(*id)],
        ),
        WriteOp::Nullify {
            table,
            column,
            target_id,
        } => (
            format!(
                "UPDATE {0} SET {1} = NULL WHERE {1} = ?1",
                ident(table),
                ident(column)
            ),
            vec![Value::Integer(*target_id)],
        ),
    }
}

fn bind_all<'q>(mut statement: Statement<'q>, params: &[Value]) -> Statement<'q> {
    for value in params {
        statement = match value.normalized() {
            Value::Null => statement.bind(None::<i64>),
            Value::Integer(i) => statement.bind(i),
            Value::Real(f) => statement.bind(f),
            Value::Text(s) => statement.bind(s),
            // normalized() only yields the four storage forms above
            other => statement.bind(other.to_string()),
        };
    }
    statement
}

async fn apply(conn: &mut SqliteConnection, op: &WriteOp) -> DbResult<WriteResult> {
    let (sql, params) = write_sql(op);
    debug!(sql = %sql, op = op.kind(), "Executing write");

    let done = bind_all(sqlx::query(&sql), &params)
        .execute(&mut *conn)
        .await?;

    Ok(WriteResult {
        rows_affected: done.rows_affected(),
        last_insert_id: matches!(op, WriteOp::Insert { .. }).then(|| done.last_insert_rowid()),
    })
}

// =============================================================================
// Row Decoding
// =============================================================================

fn decode_row(row: &SqliteRow) -> DbResult<Row> {
    let mut out = Row::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let storage = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_string())
            }
        };

        let value = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER") | Some("BOOLEAN") => Value::Integer(row.try_get::<i64, _>(idx)?),
            Some("REAL") => Value::Real(row.try_get::<f64, _>(idx)?),
            Some("BLOB") => {
                let bytes: Vec<u8> = row.try_get(idx)?;
                Value::Text(String::from_utf8_lossy(&bytes).into_owned())
            }
            Some(_) => Value::Text(row.try_get::<String, _>(idx)?),
        };
        out.set(column.name(), value);
    }
    Ok(out)
}

// =============================================================================
// Unit Tests
// =============================================================================
