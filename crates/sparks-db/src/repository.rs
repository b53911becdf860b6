//! # Repository Facade
//!
//! One generic facade that lets every entity type be queried, joined,
//! upserted and cascade-deleted without per-entity query code.
//!
//! ## How a Call Flows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  repo.find_one_by_field(Employee::EMAIL, "a@x.com")                    │
//! │       │                                                                 │
//! │       │  Field<Employee> ──resolve──► FieldDef { column: "email" }      │
//! │       ▼                                                                 │
//! │  Query::table("employees").eq("email", "a@x.com")                      │
//! │       │                                                                 │
//! │       │  guarded(): call timeout + error logging                       │
//! │       ▼                                                                 │
//! │  RowStore::query ──► Vec<Row> ──► Employee::from_row                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Outcome { found: true, value: Some(employee) }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Error Policy
//! - No match is `Ok(Outcome)` with `found = false`, never an error
//! - Storage and decode failures are logged here once and returned as `Err`
//! - Programmer errors panic: a field naming an undeclared attribute, a join
//!   on something that is not an association, a cascade dependent that does
//!   not reference the deleted type
//!
//! ## Entity Lifecycle
//! ```text
//! Transient ──upsert──► Persisted ──cascade_disconnect──► Disconnected
//!  (id None)             (id Some)                          │
//!                                                delete_by_id ▼
//!                                                          Deleted
//! ```
//! `disconnect_and_delete` runs the last two steps as one transaction.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use sparks_core::{Entity, Field, FieldDef, FieldRef, Outcome, Row, Value, ID_COLUMN};

use crate::error::{DbError, DbResult};
use crate::store::{Query, RowStore, WriteOp, WriteResult};

/// Generic persistence facade over a [`RowStore`].
///
/// Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn RowStore>,
    call_timeout: Option<Duration>,
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl Repository {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Repository {
            store,
            call_timeout: None,
        }
    }

    /// Bounds every storage call; an expired call yields [`DbError::Timeout`].
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Finds the entity whose `field` equals `value`.
    ///
    /// When several rows match, the first inserted one (lowest id) wins and
    /// a warning is logged.
    pub async fn find_one_by_field<T: Entity>(
        &self,
        field: Field<T>,
        value: impl Into<Value>,
    ) -> DbResult<Outcome<Option<T>>> {
        let def = field.resolve();
        let value = value.into();
        debug!(entity = T::SCHEMA.tag, field = def.name, value = %value, "find_one_by_field");

        let query = Query::table(T::SCHEMA.tag).eq(def.column, value);
        let rows = self
            .guarded("find_one_by_field", T::SCHEMA.tag, self.store.query(&query))
            .await?;

        if rows.len() > 1 {
            warn!(
                entity = T::SCHEMA.tag,
                field = def.name,
                matches = rows.len(),
                "Several rows match a single-entity lookup; using the first"
            );
        }

        match rows.first() {
            Some(row) => Ok(Outcome::found(decode::<T>(row)?)),
            None => Ok(Outcome::not_found()),
        }
    }

    /// Finds every entity whose `field` equals `value`, ordered by id.
    pub async fn find_all_by_field<T: Entity>(
        &self,
        field: Field<T>,
        value: impl Into<Value>,
    ) -> DbResult<Outcome<Vec<T>>> {
        let def = field.resolve();
        let value = value.into();
        debug!(entity = T::SCHEMA.tag, field = def.name, value = %value, "find_all_by_field");

        let query = Query::table(T::SCHEMA.tag).eq(def.column, value);
        let rows = self
            .guarded("find_all_by_field", T::SCHEMA.tag, self.store.query(&query))
            .await?;

        Ok(Outcome::from_list(decode_all::<T>(&rows)?))
    }

    /// Every stored entity of type `T`, ordered by id.
    pub async fn find_all<T: Entity>(&self) -> DbResult<Outcome<Vec<T>>> {
        let query = Query::table(T::SCHEMA.tag);
        let rows = self
            .guarded("find_all", T::SCHEMA.tag, self.store.query(&query))
            .await?;

        Ok(Outcome::from_list(decode_all::<T>(&rows)?))
    }

    /// Like [`Repository::find_all_by_field`], with the named associations
    /// resolved eagerly.
    ///
    /// Each association is fetched with one batched lookup. Duplicate names
    /// are ignored; an empty list behaves like `find_all_by_field`. A
    /// reference to a row that no longer exists stays unresolved.
    ///
    /// ## Panics
    /// When a name is not an association of `T`.
    pub async fn find_with_joins<T: Entity>(
        &self,
        field: Field<T>,
        value: impl Into<Value>,
        joins: &[&str],
    ) -> DbResult<Outcome<Vec<T>>> {
        let def = field.resolve();
        let value = value.into();
        debug!(
            entity = T::SCHEMA.tag,
            field = def.name,
            value = %value,
            joins = joins.len(),
            "find_with_joins"
        );

        let query = Query::table(T::SCHEMA.tag).eq(def.column, value);
        self.query_with_joins::<T>("find_with_joins", query, joins)
            .await
    }

    /// Like [`Repository::find_all`], with the named associations resolved
    /// the same way as [`Repository::find_with_joins`].
    ///
    /// ## Panics
    /// When a name is not an association of `T`.
    pub async fn find_all_with_joins<T: Entity>(
        &self,
        joins: &[&str],
    ) -> DbResult<Outcome<Vec<T>>> {
        debug!(entity = T::SCHEMA.tag, joins = joins.len(), "find_all_with_joins");
        self.query_with_joins::<T>("find_all_with_joins", Query::table(T::SCHEMA.tag), joins)
            .await
    }

    async fn query_with_joins<T: Entity>(
        &self,
        operation: &'static str,
        query: Query,
        joins: &[&str],
    ) -> DbResult<Outcome<Vec<T>>> {
        let mut seen = HashSet::new();
        let associations: Vec<&'static FieldDef> = joins
            .iter()
            .filter(|name| seen.insert(**name))
            .map(|name| T::SCHEMA.expect_association(name))
            .collect();

        let rows = self
            .guarded(operation, T::SCHEMA.tag, self.store.query(&query))
            .await?;
        let mut entities = decode_all::<T>(&rows)?;

        for association in associations {
            let targets = self
                .fetch_targets::<T>(operation, association, &rows)
                .await?;

            for (entity, row) in entities.iter_mut().zip(&rows) {
                let Some(target_id) = row.opt_i64(association.column).map_err(DbError::from)? else {
                    continue;
                };
                match targets.get(&target_id) {
                    Some(target) => entity.attach(association.name, target).map_err(|e| {
                        error!(entity = T::SCHEMA.tag, association = association.name, error = %e, "Attach failed");
                        DbError::from(e)
                    })?,
                    None => warn!(
                        entity = T::SCHEMA.tag,
                        association = association.name,
                        target_id,
                        "Dangling reference left unresolved"
                    ),
                }
            }
        }

        Ok(Outcome::from_list(entities))
    }

    /// Loads the rows `association` points at, keyed by id.
    async fn fetch_targets<T: Entity>(
        &self,
        operation: &'static str,
        association: &'static FieldDef,
        rows: &[Row],
    ) -> DbResult<HashMap<i64, Row>> {
        let mut ids = Vec::new();
        let mut seen = HashSet::new();
        for row in rows {
            if let Some(id) = row.opt_i64(association.column)? {
                if seen.insert(id) {
                    ids.push(Value::Integer(id));
                }
            }
        }
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        // expect_association guarantees a reference target
        let target_table = association.references.unwrap_or_default();
        let query = Query::table(target_table).any_of(ID_COLUMN, ids);
        let targets = self
            .guarded(operation, target_table, self.store.query(&query))
            .await?;

        Ok(targets
            .into_iter()
            .filter_map(|row| row.id().map(|id| (id, row)))
            .collect())
    }

    /// Direct identity lookup.
    pub async fn find_by_id<T: Entity>(&self, id: i64) -> DbResult<Outcome<Option<T>>> {
        debug!(entity = T::SCHEMA.tag, id, "find_by_id");

        let query = Query::table(T::SCHEMA.tag).eq(ID_COLUMN, id);
        let rows = self
            .guarded("find_by_id", T::SCHEMA.tag, self.store.query(&query))
            .await?;

        match rows.first() {
            Some(row) => Ok(Outcome::found(decode::<T>(row)?)),
            None => Ok(Outcome::not_found()),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts `entity` when it has no identity yet, updates it otherwise.
    ///
    /// On insert the assigned identity is written back into `entity`.
    /// Persisting the same unchanged entity twice leaves exactly one row.
    ///
    /// ## Errors
    /// [`DbError::NotFound`] when `entity` has an identity whose row no
    /// longer exists; the row is not recreated.
    pub async fn upsert<T: Entity>(&self, entity: &mut T) -> DbResult<i64> {
        match entity.id() {
            None => {
                let op = WriteOp::Insert {
                    table: T::SCHEMA.tag,
                    row: entity.to_row(),
                };
                let result = self
                    .guarded("upsert", T::SCHEMA.tag, self.store.execute(op))
                    .await?;
                let id = result.last_insert_id.ok_or_else(|| {
                    error!(entity = T::SCHEMA.tag, "Store reported no identity for insert");
                    DbError::Internal(format!("insert into {} returned no id", T::SCHEMA.tag))
                })?;
                entity.set_id(id);
                debug!(entity = T::SCHEMA.tag, id, "Inserted");
                Ok(id)
            }
            Some(id) => {
                let op = WriteOp::Update {
                    table: T::SCHEMA.tag,
                    id,
                    row: entity.to_row(),
                };
                let result = self
                    .guarded("upsert", T::SCHEMA.tag, self.store.execute(op))
                    .await?;
                if result.rows_affected == 0 {
                    warn!(entity = T::SCHEMA.tag, id, "Update addressed a missing row");
                    return Err(DbError::not_found(T::SCHEMA.tag, id));
                }
                debug!(entity = T::SCHEMA.tag, id, "Updated");
                Ok(id)
            }
        }
    }

    /// Removes the row with `id`. Returns `false` when no such row existed.
    ///
    /// Rows still referenced by dependents cannot be removed on a store that
    /// enforces references; disconnect them first (or use
    /// [`Repository::disconnect_and_delete`]).
    pub async fn delete_by_id<T: Entity>(&self, id: i64) -> DbResult<bool> {
        let op = WriteOp::Delete {
            table: T::SCHEMA.tag,
            id,
        };
        let result = self
            .guarded("delete_by_id", T::SCHEMA.tag, self.store.execute(op))
            .await?;
        debug!(entity = T::SCHEMA.tag, id, deleted = result.rows_affected > 0, "delete_by_id");
        Ok(result.rows_affected > 0)
    }

    /// Clears every dependent reference to `target`, in one atomic unit.
    ///
    /// Each entry of `dependents` names a reference field on another entity
    /// type that points at `T`. Returns the number of rows changed. A target
    /// that was never persisted has no dependents.
    ///
    /// ## Panics
    /// When a dependent is not a reference to `T`.
    pub async fn cascade_disconnect<T: Entity>(
        &self,
        target: &T,
        dependents: &[FieldRef],
    ) -> DbResult<u64> {
        let ops = nullify_ops::<T>(dependents, target.id());
        let Some(id) = target.id() else {
            return Ok(0);
        };

        let results = self
            .guarded("cascade_disconnect", T::SCHEMA.tag, self.store.execute_atomic(ops))
            .await?;
        let cleared = results.iter().map(|r| r.rows_affected).sum();
        debug!(entity = T::SCHEMA.tag, id, cleared, "cascade_disconnect");
        Ok(cleared)
    }

    /// Clears every dependent reference to the row with `id`, then deletes
    /// it, as one transaction. Returns whether the row existed.
    ///
    /// ## Panics
    /// When a dependent is not a reference to `T`.
    pub async fn disconnect_and_delete<T: Entity>(
        &self,
        id: i64,
        dependents: &[FieldRef],
    ) -> DbResult<bool> {
        let mut ops = nullify_ops::<T>(dependents, Some(id));
        ops.push(WriteOp::Delete {
            table: T::SCHEMA.tag,
            id,
        });

        let results = self
            .guarded("disconnect_and_delete", T::SCHEMA.tag, self.store.execute_atomic(ops))
            .await?;
        let deleted = results.last().is_some_and(|r: &WriteResult| r.rows_affected > 0);
        debug!(entity = T::SCHEMA.tag, id, deleted, "disconnect_and_delete");
        Ok(deleted)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn health_check(&self) -> bool {
        self.store.health_check().await
    }

    /// Closes the underlying store for every clone of this repository.
    pub async fn close(&self) {
        self.store.close().await;
    }

    /// Runs one storage call under the call timeout and logs its failure.
    async fn guarded<R>(
        &self,
        operation: &'static str,
        entity: &'static str,
        call: impl Future<Output = DbResult<R>>,
    ) -> DbResult<R> {
        let result = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, call).await {
                Ok(result) => result,
                Err(_) => Err(DbError::Timeout {
                    operation: operation.to_string(),
                    after: limit,
                }),
            },
            None => call.await,
        };

        if let Err(err) = &result {
            error!(operation, entity, error = %err, "Storage call failed");
        }
        result
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn decode<T: Entity>(row: &Row) -> DbResult<T> {
    T::from_row(row).map_err(|e| {
        error!(entity = T::SCHEMA.tag, id = ?row.id(), error = %e, "Row decode failed");
        DbError::from(e)
    })
}

fn decode_all<T: Entity>(rows: &[Row]) -> DbResult<Vec<T>> {
    rows.iter().map(decode::<T>).collect()
}

/// Checks every dependent and builds its nullify operation.
fn nullify_ops<T: Entity>(dependents: &[FieldRef], target_id: Option<i64>) -> Vec<WriteOp> {
    let mut ops = Vec::with_capacity(dependents.len() + 1);
    for dependent in dependents {
        let def = dependent.resolve();
        assert!(
            def.is_association() && def.references == Some(T::SCHEMA.tag),
            "{:?} does not reference '{}'",
            dependent,
            T::SCHEMA.tag
        );
        if let Some(target_id) = target_id {
            ops.push(WriteOp::Nullify {
                table: dependent.entity(),
                column: def.column,
                target_id,
            });
        }
    }
    ops
}

// =============================================================================
// Unit Tests
// =============================================================================
