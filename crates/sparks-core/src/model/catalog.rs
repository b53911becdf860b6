//! Sellable items and the lookup lists around them.

use crate::entity::{ref_from_row, Entity, EntitySchema, Field, FieldDef, FieldKind, Ref};
use crate::error::DecodeError;
use crate::money::Money;
use crate::value::{Row, ID_COLUMN};

/// A lookup record identified by its unique name.
pub trait Named: Entity {
    const NAME_FIELD: Field<Self>;

    fn with_name(name: String) -> Self;

    fn name(&self) -> &str;
}

/// Declares a lookup entity that only carries a unique name.
macro_rules! named_entity {
    ($(#[$meta:meta])* $ty:ident, $table:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $ty {
            pub id: Option<i64>,
            pub name: String,
        }

        impl $ty {
            pub const NAME: Field<$ty> = Field::new("name");

            pub fn new(name: impl Into<String>) -> Self {
                $ty {
                    id: None,
                    name: name.into(),
                }
            }
        }

        impl Named for $ty {
            const NAME_FIELD: Field<$ty> = $ty::NAME;

            fn with_name(name: String) -> Self {
                $ty::new(name)
            }

            fn name(&self) -> &str {
                &self.name
            }
        }

        impl Entity for $ty {
            const SCHEMA: &'static EntitySchema = &EntitySchema {
                tag: $table,
                fields: &[
                    FieldDef::scalar("name", FieldKind::Text),
                ],
            };

            fn id(&self) -> Option<i64> {
                self.id
            }

            fn set_id(&mut self, id: i64) {
                self.id = Some(id);
            }

            fn to_row(&self) -> Row {
                Row::new().with("name", &self.name)
            }

            fn from_row(row: &Row) -> Result<Self, DecodeError> {
                Ok($ty {
                    id: row.opt_i64(ID_COLUMN)?,
                    name: row.text("name")?,
                })
            }
        }
    };
}

named_entity!(
    /// Groups items on the inventory screen.
    Category,
    "categories"
);

named_entity!(
    /// Who delivers goods; attached to arrival documents.
    Supplier,
    "suppliers"
);

named_entity!(
    /// A registered customer.
    Client,
    "clients"
);

// =============================================================================
// Item
// =============================================================================

/// A stocked, sellable article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    pub id: Option<i64>,
    pub name: String,
    pub category: Ref<Category>,
    /// Selling price.
    pub price: Money,
    /// Last purchase price from a supplier.
    pub arrival_price: Money,
    pub quantity: i64,
}

impl Item {
    pub const NAME: Field<Item> = Field::new("name");
    pub const CATEGORY: Field<Item> = Field::new("category");

    pub fn new(name: impl Into<String>, category: Ref<Category>) -> Self {
        Item {
            name: name.into(),
            category,
            ..Item::default()
        }
    }
}

impl Entity for Item {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "items",
        fields: &[
            FieldDef::scalar("name", FieldKind::Text),
            FieldDef::reference("category", "category_id", "categories"),
            FieldDef::scalar("price", FieldKind::Integer),
            FieldDef::scalar("arrival_price", FieldKind::Integer),
            FieldDef::scalar("quantity", FieldKind::Integer),
        ],
    };

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Row {
        Row::new()
            .with("name", &self.name)
            .with("category_id", self.category.id())
            .with("price", self.price)
            .with("arrival_price", self.arrival_price)
            .with("quantity", self.quantity)
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(Item {
            id: row.opt_i64(ID_COLUMN)?,
            name: row.text("name")?,
            category: ref_from_row(row, "category_id")?,
            price: Money::from_cents(row.i64("price")?),
            arrival_price: Money::from_cents(row.i64("arrival_price")?),
            quantity: row.i64("quantity")?,
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "category" => {
                self.category.resolve(Category::from_row(target)?);
                Ok(())
            }
            other => Err(DecodeError::UnknownAssociation {
                entity: Self::SCHEMA.tag,
                association: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_item_row_uses_cents() {
        let mut item = Item::new("Milk", Ref::to_id(2));
        item.price = Money::from_cents(199);
        let row = item.to_row();
        assert_eq!(row.get("price"), Some(&Value::Integer(199)));
        assert_eq!(row.get("category_id"), Some(&Value::Integer(2)));
        assert!(row.get(ID_COLUMN).is_none());
    }

    #[test]
    fn test_item_attach_category() {
        let row = Item::new("Milk", Ref::to_id(2)).to_row().with(ID_COLUMN, 7_i64);
        let mut item = Item::from_row(&row).unwrap();
        assert!(!item.category.is_resolved());

        let category = Row::new().with(ID_COLUMN, 2_i64).with("name", "Dairy");
        item.attach("category", &category).unwrap();
        assert_eq!(item.category.get().map(|c| c.name.as_str()), Some("Dairy"));
    }

    #[test]
    fn test_named_entities_have_distinct_tables() {
        assert_eq!(Category::SCHEMA.tag, "categories");
        assert_eq!(Supplier::SCHEMA.tag, "suppliers");
        assert_eq!(Client::SCHEMA.tag, "clients");
        assert_eq!(Supplier::NAME.resolve().column, "name");
    }
}
