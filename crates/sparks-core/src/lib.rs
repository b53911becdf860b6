//! # sparks-core: Types Behind the Sparks Back Office
//!
//! Everything the storage layer and the business services agree on, with
//! zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Sparks Back Office Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Business Services (apps/backoffice)            │   │
//! │  │      LoginService ── InventoryService ── ArrivalGoodsService    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sparks-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  entity   │  │  outcome  │  │ registry  │  │   model   │  │   │
//! │  │   │  Field<E> │  │ (found,   │  │ get /     │  │ Item, ... │  │   │
//! │  │   │  Ref<T>   │  │  value)   │  │ rebind    │  │ Employee  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK                             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  sparks-db (Storage Layer)                      │   │
//! │  │        Repository facade, row stores, audit log, migrations     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`entity`] - The `Entity` trait, schema tables, field references, `Ref<T>`
//! - [`value`] - `Value` and `Row`, the storage-neutral record shape
//! - [`outcome`] - The `(found, value)` pair every lookup returns
//! - [`registry`] - Type-keyed singleton registry
//! - [`model`] - Business entities (employees, items, arrival documents)
//! - [`money`] - Integer-cents money
//! - [`validation`] - Input rules
//! - [`error`] - Decode and validation errors
//!
//! ## Example Usage
//!
//! ```rust
//! use sparks_core::{Entity, Field, Item, Money, Ref};
//!
//! let mut item = Item::new("Milk", Ref::to_id(1));
//! item.price = Money::from_cents(199);
//!
//! let by_name: Field<Item> = Item::NAME;
//! assert_eq!(by_name.resolve().column, "name");
//! assert_eq!(item.to_row().get("category_id").and_then(|v| v.as_i64()), Some(1));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entity;
pub mod error;
pub mod model;
pub mod money;
pub mod outcome;
pub mod registry;
pub mod validation;
pub mod value;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use entity::{ref_from_row, Entity, EntitySchema, Field, FieldDef, FieldKind, FieldRef, Ref};
pub use error::{DecodeError, ValidationError};
pub use model::*;
pub use money::Money;
pub use outcome::Outcome;
pub use registry::Registry;
pub use value::{Row, Value, ID_COLUMN};
