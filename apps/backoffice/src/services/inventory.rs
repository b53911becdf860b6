//! # Inventory Service
//!
//! Items and the lookup lists around them (categories, suppliers, clients).
//!
//! ## Deleting Referenced Records
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  delete_item(7)                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  disconnect_and_delete::<Item>(7, [NomenclatureDetails.item,            │
//! │                                    TransactionDetail.item])             │
//! │       │                                                                 │
//! │       │  one transaction:                                               │
//! │       │    UPDATE nomenclature_details SET item_id = NULL ...           │
//! │       │    UPDATE transaction_details  SET item_id = NULL ...           │
//! │       │    DELETE FROM items WHERE id = 7                               │
//! │       ▼                                                                 │
//! │  arrival and sale lines survive with their item cleared                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Deleted    | Dependents cleared           |
//! |------------|------------------------------|
//! | Item       | NomenclatureDetails.item, TransactionDetail.item |
//! | Category   | Item.category                |
//! | Supplier   | Nomenclature.supplier        |
//! | Client     | -                            |
//!
//! Every failure is written to the audit log before it is returned.

use std::sync::Arc;

use tracing::{debug, info};

use sparks_core::validation::{validate_name, validate_price, validate_quantity};
use sparks_core::{
    Category, Client, Entity, FieldRef, Item, Money, Named, Nomenclature, NomenclatureDetails, Ref,
    Registry, Supplier, TransactionDetail, ValidationError,
};
use sparks_db::{AuditLog, Repository};

use crate::error::{AppError, AppResult};
use crate::services::audit_failure;

/// What the operator entered for an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub name: String,
    /// Category name; `None` leaves the item uncategorized.
    pub category: Option<String>,
    pub price: Money,
    pub arrival_price: Money,
    pub quantity: i64,
}

impl ItemDraft {
    /// Builds a draft from raw form input.
    pub fn from_input(
        name: &str,
        category: &str,
        price: &str,
        arrival_price: &str,
        quantity: &str,
    ) -> AppResult<Self> {
        let category = category.trim();
        let quantity = quantity
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: "expected a whole number".to_string(),
            })?;

        Ok(ItemDraft {
            name: name.to_string(),
            category: (!category.is_empty()).then(|| category.to_string()),
            price: Money::parse("price", price)?,
            arrival_price: Money::parse("arrival price", arrival_price)?,
            quantity,
        })
    }

    fn validate(&self) -> AppResult<String> {
        let name = validate_name("name", &self.name)?;
        validate_price("price", self.price)?;
        validate_price("arrival price", self.arrival_price)?;
        validate_quantity(self.quantity)?;
        Ok(name)
    }
}

pub struct InventoryService {
    repository: Arc<Repository>,
    audit: Arc<AuditLog>,
}

impl InventoryService {
    pub fn new(registry: &Arc<Registry>) -> Self {
        InventoryService {
            repository: registry.require::<Repository>(),
            audit: registry.require::<AuditLog>(),
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// Items named `text`, with their category resolved. Blank text lists
    /// every item.
    pub async fn search_items(&self, text: &str) -> AppResult<Vec<Item>> {
        let text = text.trim();
        let result: AppResult<Vec<Item>> = async {
            let items = if text.is_empty() {
                self.repository
                    .find_all_with_joins::<Item>(&["category"])
                    .await?
            } else {
                self.repository
                    .find_with_joins(Item::NAME, text, &["category"])
                    .await?
            };
            Ok(items.into_value())
        }
        .await;

        let items = audit_failure(
            &self.audit,
            "Load Items Error",
            || format!("Failed to load items with text: {}", text),
            result,
        )
        .await?;
        debug!(text, count = items.len(), "Items loaded");
        Ok(items)
    }

    pub async fn create_item(&self, draft: ItemDraft) -> AppResult<Item> {
        let label = draft.name.clone();
        let result: AppResult<Item> = async {
            let name = draft.validate()?;
            let mut item = Item {
                name,
                category: self.category_ref(draft.category.as_deref()).await?,
                price: draft.price,
                arrival_price: draft.arrival_price,
                quantity: draft.quantity,
                ..Item::default()
            };
            self.repository.upsert(&mut item).await?;
            Ok(item)
        }
        .await;

        let item = audit_failure(
            &self.audit,
            "Create Item Error",
            || format!("Failed to create item: {}", label),
            result,
        )
        .await?;
        info!(item = ?item.id, name = %item.name, "Item created");
        Ok(item)
    }

    pub async fn update_item(&self, id: i64, draft: ItemDraft) -> AppResult<Item> {
        let result: AppResult<Item> = async {
            let name = draft.validate()?;
            let mut item = self
                .repository
                .find_by_id::<Item>(id)
                .await?
                .into_option()
                .ok_or_else(|| AppError::not_found("Item", &id.to_string()))?;

            item.name = name;
            item.category = self.category_ref(draft.category.as_deref()).await?;
            item.price = draft.price;
            item.arrival_price = draft.arrival_price;
            item.quantity = draft.quantity;
            self.repository.upsert(&mut item).await?;
            Ok(item)
        }
        .await;

        let item = audit_failure(
            &self.audit,
            "Update Item Error",
            || format!("Failed to update item with ID: {}", id),
            result,
        )
        .await?;
        info!(item = id, "Item updated");
        Ok(item)
    }

    /// Deletes item `id`; arrival and sale lines keep existing without it.
    pub async fn delete_item(&self, id: i64) -> AppResult<()> {
        let dependents = [NomenclatureDetails::ITEM.erase(), TransactionDetail::ITEM.erase()];
        self.delete::<Item>(id, &dependents, "Delete Item Error", "item")
            .await
    }

    // =========================================================================
    // Categories, Suppliers, Clients
    // =========================================================================

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.list::<Category>().await
    }

    pub async fn create_category(&self, name: &str) -> AppResult<Category> {
        self.create::<Category>(name, "Create Category Error").await
    }

    /// Deletes a category; its items become uncategorized.
    pub async fn delete_category(&self, id: i64) -> AppResult<()> {
        self.delete::<Category>(id, &[Item::CATEGORY.erase()], "Delete Category Error", "category")
            .await
    }

    pub async fn list_suppliers(&self) -> AppResult<Vec<Supplier>> {
        self.list::<Supplier>().await
    }

    pub async fn create_supplier(&self, name: &str) -> AppResult<Supplier> {
        self.create::<Supplier>(name, "Create Supplier Error").await
    }

    /// Deletes a supplier; its arrival documents lose their supplier.
    pub async fn delete_supplier(&self, id: i64) -> AppResult<()> {
        self.delete::<Supplier>(
            id,
            &[Nomenclature::SUPPLIER.erase()],
            "Delete Supplier Error",
            "supplier",
        )
        .await
    }

    pub async fn list_clients(&self) -> AppResult<Vec<Client>> {
        self.list::<Client>().await
    }

    pub async fn create_client(&self, name: &str) -> AppResult<Client> {
        self.create::<Client>(name, "Create Client Error").await
    }

    pub async fn delete_client(&self, id: i64) -> AppResult<()> {
        self.delete::<Client>(id, &[], "Delete Client Error", "client")
            .await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn category_ref(&self, name: Option<&str>) -> AppResult<Ref<Category>> {
        let Some(name) = name else {
            return Ok(Ref::none());
        };
        self.repository
            .find_one_by_field(Category::NAME, name)
            .await?
            .into_option()
            .map(Ref::to)
            .ok_or_else(|| AppError::not_found("Category", name))
    }

    async fn list<T: Named>(&self) -> AppResult<Vec<T>> {
        Ok(self.repository.find_all::<T>().await?.into_value())
    }

    async fn create<T: Named>(&self, name: &str, action: &str) -> AppResult<T> {
        let result: AppResult<T> = async {
            let name = validate_name("name", name)?;
            let existing = self
                .repository
                .find_one_by_field(T::NAME_FIELD, name.as_str())
                .await?;
            if existing.is_found() {
                return Err(AppError::validation(format!("'{}' already exists", name)));
            }

            let mut record = T::with_name(name);
            self.repository.upsert(&mut record).await?;
            Ok(record)
        }
        .await;

        let record = audit_failure(
            &self.audit,
            action,
            || format!("Failed to create: {}", name.trim()),
            result,
        )
        .await?;
        info!(entity = T::SCHEMA.tag, id = ?record.id(), name = record.name(), "Created");
        Ok(record)
    }

    async fn delete<T: Entity>(
        &self,
        id: i64,
        dependents: &[FieldRef],
        action: &str,
        label: &str,
    ) -> AppResult<()> {
        let result: AppResult<()> = async {
            let deleted = self
                .repository
                .disconnect_and_delete::<T>(id, dependents)
                .await?;
            if !deleted {
                return Err(AppError::not_found(label, &id.to_string()));
            }
            Ok(())
        }
        .await;

        audit_failure(
            &self.audit,
            action,
            || format!("Failed to delete {} with ID: {}", label, id),
            result,
        )
        .await?;
        info!(entity = T::SCHEMA.tag, id, "Deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_from_input() {
        let draft = ItemDraft::from_input("Milk", " Dairy ", "1.99", "0.9", "12").unwrap();
        assert_eq!(draft.category.as_deref(), Some("Dairy"));
        assert_eq!(draft.price, Money::from_cents(199));
        assert_eq!(draft.arrival_price, Money::from_cents(90));
        assert_eq!(draft.quantity, 12);

        let uncategorized = ItemDraft::from_input("Milk", "", "1", "1", "0").unwrap();
        assert!(uncategorized.category.is_none());
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        assert!(ItemDraft::from_input("Milk", "", "1.999", "1", "1").is_err());
        assert!(ItemDraft::from_input("Milk", "", "1", "1", "a dozen").is_err());

        let negative = ItemDraft {
            name: "Milk".into(),
            quantity: -1,
            ..ItemDraft::default()
        };
        assert!(negative.validate().is_err());

        let blank = ItemDraft::default();
        assert_eq!(
            blank.validate().unwrap_err().message,
            "name is required"
        );
    }
}
