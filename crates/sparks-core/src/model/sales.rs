//! Sold lines. Only what inventory maintenance needs to disconnect on delete.

use crate::entity::{ref_from_row, Entity, EntitySchema, Field, FieldDef, FieldKind, Ref};
use crate::error::DecodeError;
use crate::model::catalog::Item;
use crate::money::Money;
use crate::value::{Row, ID_COLUMN};

/// One line of a completed sale.
///
/// `item` becomes unset when the item is removed from the catalog; the line
/// keeps its quantity and price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionDetail {
    pub id: Option<i64>,
    pub item: Ref<Item>,
    pub quantity: i64,
    pub price: Money,
}

impl TransactionDetail {
    pub const ITEM: Field<TransactionDetail> = Field::new("item");
}

impl Entity for TransactionDetail {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "transaction_details",
        fields: &[
            FieldDef::reference("item", "item_id", "items"),
            FieldDef::scalar("quantity", FieldKind::Integer),
            FieldDef::scalar("price", FieldKind::Integer),
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
            .with("item_id", self.item.id())
            .with("quantity", self.quantity)
            .with("price", self.price)
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(TransactionDetail {
            id: row.opt_i64(ID_COLUMN)?,
            item: ref_from_row(row, "item_id")?,
            quantity: row.i64("quantity")?,
            price: Money::from_cents(row.i64("price")?),
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "item" => {
                self.item.resolve(Item::from_row(target)?);
                Ok(())
            }
            other => Err(DecodeError::UnknownAssociation {
                entity: Self::SCHEMA.tag,
                association: other.to_string(),
            }),
        }
    }
}
