//! Goods arrival documents.
//!
//! ```text
//! InvoiceStore ──► Nomenclature ──► Supplier
//!                       ▲
//! NomenclatureDetails ──┘──► Item
//! ```
//!
//! An invoice posts one nomenclature (the arrival document); each detail row
//! records one item line of it.

use chrono::NaiveDate;

use crate::entity::{ref_from_row, Entity, EntitySchema, Field, FieldDef, FieldKind, Ref};
use crate::error::DecodeError;
use crate::model::catalog::{Item, Supplier};
use crate::money::Money;
use crate::value::{Row, Value, ID_COLUMN};

fn unknown<E: Entity>(association: &str) -> DecodeError {
    DecodeError::UnknownAssociation {
        entity: E::SCHEMA.tag,
        association: association.to_string(),
    }
}

// =============================================================================
// Nomenclature
// =============================================================================

/// An arrival document: a delivery from one supplier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Nomenclature {
    pub id: Option<i64>,
    pub supplier: Ref<Supplier>,
}

impl Nomenclature {
    pub const SUPPLIER: Field<Nomenclature> = Field::new("supplier");
}

impl Entity for Nomenclature {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "nomenclatures",
        fields: &[FieldDef::reference("supplier", "supplier_id", "suppliers")],
    };

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    fn to_row(&self) -> Row {
        Row::new().with("supplier_id", self.supplier.id())
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(Nomenclature {
            id: row.opt_i64(ID_COLUMN)?,
            supplier: ref_from_row(row, "supplier_id")?,
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "supplier" => self.supplier.resolve(Supplier::from_row(target)?),
            other => return Err(unknown::<Self>(other)),
        }
        Ok(())
    }
}

// =============================================================================
// Nomenclature Details
// =============================================================================

/// One item line of an arrival document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NomenclatureDetails {
    pub id: Option<i64>,
    pub nomenclature: Ref<Nomenclature>,
    pub item: Ref<Item>,
    pub item_quantity: i64,
    /// Purchase price per unit on this delivery.
    pub item_price: Money,
}

impl NomenclatureDetails {
    pub const NOMENCLATURE: Field<NomenclatureDetails> = Field::new("nomenclature");
    pub const ITEM: Field<NomenclatureDetails> = Field::new("item");
}

impl Entity for NomenclatureDetails {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "nomenclature_details",
        fields: &[
            FieldDef::reference("nomenclature", "nomenclature_id", "nomenclatures"),
            FieldDef::reference("item", "item_id", "items"),
            FieldDef::scalar("item_quantity", FieldKind::Integer),
            FieldDef::scalar("item_price", FieldKind::Integer),
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
            .with("nomenclature_id", self.nomenclature.id())
            .with("item_id", self.item.id())
            .with("item_quantity", self.item_quantity)
            .with("item_price", self.item_price)
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        Ok(NomenclatureDetails {
            id: row.opt_i64(ID_COLUMN)?,
            nomenclature: ref_from_row(row, "nomenclature_id")?,
            item: ref_from_row(row, "item_id")?,
            item_quantity: row.i64("item_quantity")?,
            item_price: Money::from_cents(row.i64("item_price")?),
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "nomenclature" => self.nomenclature.resolve(Nomenclature::from_row(target)?),
            "item" => self.item.resolve(Item::from_row(target)?),
            other => return Err(unknown::<Self>(other)),
        }
        Ok(())
    }
}

// =============================================================================
// Invoice
// =============================================================================

/// The invoice that posts an arrival document.
///
/// `status` is `false` while the document is a draft; once posted the lines
/// are no longer editable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceStore {
    pub id: Option<i64>,
    pub number: i64,
    pub date: Option<NaiveDate>,
    pub nomenclature: Ref<Nomenclature>,
    pub final_price: Money,
    pub status: bool,
}

impl InvoiceStore {
    pub const NUMBER: Field<InvoiceStore> = Field::new("number");
    pub const DATE: Field<InvoiceStore> = Field::new("date");
    pub const NOMENCLATURE: Field<InvoiceStore> = Field::new("nomenclature");
    pub const STATUS: Field<InvoiceStore> = Field::new("status");
}

impl Entity for InvoiceStore {
    const SCHEMA: &'static EntitySchema = &EntitySchema {
        tag: "invoice_stores",
        fields: &[
            FieldDef::scalar("number", FieldKind::Integer),
            FieldDef::scalar("date", FieldKind::Date),
            FieldDef::reference("nomenclature", "nomenclature_id", "nomenclatures"),
            FieldDef::scalar("final_price", FieldKind::Integer),
            FieldDef::scalar("status", FieldKind::Bool),
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
            .with("number", self.number)
            .with("date", self.date)
            .with("nomenclature_id", self.nomenclature.id())
            .with("final_price", self.final_price)
            .with("status", self.status)
    }

    fn from_row(row: &Row) -> Result<Self, DecodeError> {
        let date = match row.get("date") {
            None | Some(Value::Null) => None,
            Some(_) => Some(row.date("date")?),
        };
        Ok(InvoiceStore {
            id: row.opt_i64(ID_COLUMN)?,
            number: row.i64("number")?,
            date,
            nomenclature: ref_from_row(row, "nomenclature_id")?,
            final_price: Money::from_cents(row.i64("final_price")?),
            status: row.bool("status")?,
        })
    }

    fn attach(&mut self, association: &str, target: &Row) -> Result<(), DecodeError> {
        match association {
            "nomenclature" => self.nomenclature.resolve(Nomenclature::from_row(target)?),
            other => return Err(unknown::<Self>(other)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invoice_row_normalizes_date_and_status() {
        let invoice = InvoiceStore {
            number: 12,
            date: NaiveDate::from_ymd_opt(2024, 5, 1),
            status: true,
            ..InvoiceStore::default()
        };
        let row = invoice.to_row().normalized().with(ID_COLUMN, 1_i64);
        assert_eq!(row.get("status"), Some(&Value::Integer(1)));
        assert_eq!(row.get("date"), Some(&Value::from("2024-05-01")));

        let decoded = InvoiceStore::from_row(&row).unwrap();
        assert_eq!(decoded.date, invoice.date);
        assert!(decoded.status);
    }

    #[test]
    fn test_draft_invoice_without_date() {
        let row = InvoiceStore::default().to_row().with(ID_COLUMN, 2_i64);
        assert_eq!(InvoiceStore::from_row(&row).unwrap().date, None);
    }

    #[test]
    fn test_details_attach_both_sides() {
        let mut details = NomenclatureDetails::from_row(
            &NomenclatureDetails::default()
                .to_row()
                .with(ID_COLUMN, 1_i64)
                .with("nomenclature_id", 4_i64)
                .with("item_id", 7_i64),
        )
        .unwrap();

        details
            .attach("nomenclature", &Row::new().with(ID_COLUMN, 4_i64).with("supplier_id", Value::Null))
            .unwrap();
        let item = Item::new("Milk", Ref::none()).to_row().with(ID_COLUMN, 7_i64);
        details.attach("item", &item).unwrap();

        assert!(details.nomenclature.is_resolved());
        assert_eq!(details.item.get().map(|i| i.name.as_str()), Some("Milk"));
        assert!(details.attach("supplier", &Row::new()).is_err());
    }
}
