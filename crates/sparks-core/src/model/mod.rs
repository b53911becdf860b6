//! # Business Entities
//!
//! Every record the back office stores, each registered through its own
//! [`EntitySchema`](crate::entity::EntitySchema) table.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Table                  References                                      │
//! │  ─────────────────────  ──────────────────────────────────────────      │
//! │  employees              -                                               │
//! │  employee_logs          employee_id → employees                         │
//! │  categories             -                                               │
//! │  suppliers              -                                               │
//! │  clients                -                                               │
//! │  items                  category_id → categories                        │
//! │  nomenclatures          supplier_id → suppliers                         │
//! │  nomenclature_details   nomenclature_id → nomenclatures,                │
//! │                         item_id → items                                 │
//! │  invoice_stores         nomenclature_id → nomenclatures                 │
//! │  transaction_details    item_id → items                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No reference cascades on delete. Removing a referenced record first
//! disconnects its dependents.

pub mod arrival;
pub mod catalog;
pub mod sales;
pub mod staff;

pub use arrival::{InvoiceStore, Nomenclature, NomenclatureDetails};
pub use catalog::{Category, Client, Item, Named, Supplier};
pub use sales::TransactionDetail;
pub use staff::{CurrentEmployee, Employee, EmployeeLog, EmployeeRole};
