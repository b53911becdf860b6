//! # Arrival Goods Service
//!
//! Receiving stock: arrival documents (nomenclatures), their lines, and the
//! invoice that posts them.
//!
//! ## Posting an Arrival
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  post_arrival(supplier "Acme", invoice #12, 2024-05-01, lines)          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  0. lookups                       supplier and every intake item;      │
//! │       │                           nothing written yet                   │
//! │       ▼                                                                 │
//! │  1. update_current_nomenclature   supplier attached, document persisted│
//! │       │                           if new, invoice points at it          │
//! │       ▼                                                                 │
//! │  2. save_invoice                  number + date persisted, unposted    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. process_arrival_lines         per line: item prices updated, stock │
//! │       │                           increased, detail row written,        │
//! │       │                           total += arrival price × quantity     │
//! │       ▼                                                                 │
//! │  4. finalize                      posted, persisted with its total     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A posted invoice (`status == true`) is read-only.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use sparks_core::validation::{validate_price, validate_quantity};
use sparks_core::{
    InvoiceStore, Item, Money, Nomenclature, NomenclatureDetails, Ref, Registry, Supplier,
};
use sparks_db::{AuditLog, Repository};

use crate::error::{AppError, AppResult};
use crate::services::audit_failure;

/// Quantity and prices of one arrival line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArrivalLine {
    pub quantity: i64,
    pub arrival_price: Money,
    pub price: Money,
}

/// One row the operator entered: which item arrived, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemIntake {
    pub item_id: i64,
    pub line: ArrivalLine,
}

pub struct ArrivalGoodsService {
    repository: Arc<Repository>,
    audit: Arc<AuditLog>,
}

impl ArrivalGoodsService {
    pub fn new(registry: &Arc<Registry>) -> Self {
        ArrivalGoodsService {
            repository: registry.require::<Repository>(),
            audit: registry.require::<AuditLog>(),
        }
    }

    /// Whether the invoice may still be edited.
    pub fn is_editable(invoice: Option<&InvoiceStore>) -> bool {
        invoice.map_or(true, |invoice| !invoice.status)
    }

    /// A fresh draft document and its unposted invoice.
    pub async fn new_arrival(&self) -> (Nomenclature, InvoiceStore) {
        self.audit.record("New nomenclature created", "").await;
        (Nomenclature::default(), InvoiceStore::default())
    }

    /// Arrival documents whose invoice is dated `date`.
    pub async fn load_nomenclatures(&self, date: NaiveDate) -> AppResult<Vec<Nomenclature>> {
        let result: AppResult<Vec<Nomenclature>> = async {
            let invoices = self
                .repository
                .find_with_joins(InvoiceStore::DATE, date, &["nomenclature"])
                .await?
                .into_value();
            Ok(invoices
                .into_iter()
                .filter_map(|invoice| invoice.nomenclature.get().cloned())
                .collect())
        }
        .await;

        let documents = audit_failure(
            &self.audit,
            "Load Items Error",
            || format!("Failed to load nomenclatures for {}", date),
            result,
        )
        .await?;
        info!(%date, count = documents.len(), "Loaded nomenclature list");
        Ok(documents)
    }

    /// Items of `nomenclature`, each paired with its arrival line.
    ///
    /// Lines whose item was deleted are skipped.
    pub async fn load_items_for_nomenclature(
        &self,
        nomenclature: &Nomenclature,
    ) -> AppResult<(Vec<Item>, Vec<ArrivalLine>)> {
        let Some(id) = nomenclature.id else {
            return Ok((Vec::new(), Vec::new()));
        };

        let result: AppResult<Vec<NomenclatureDetails>> = async {
            Ok(self
                .repository
                .find_with_joins(NomenclatureDetails::NOMENCLATURE, id, &["nomenclature", "item"])
                .await?
                .into_value())
        }
        .await;
        let details = audit_failure(
            &self.audit,
            "Load Items for Nomenclature Error",
            || format!("Failed to load items for nomenclature {}", id),
            result,
        )
        .await?;

        let mut items = Vec::with_capacity(details.len());
        let mut lines = Vec::with_capacity(details.len());
        for detail in details {
            let Some(item) = detail.item.get() else {
                debug!(detail = ?detail.id, "Arrival line without item skipped");
                continue;
            };
            lines.push(ArrivalLine {
                quantity: detail.item_quantity,
                arrival_price: item.arrival_price,
                price: item.price,
            });
            items.push(item.clone());
        }

        info!(nomenclature = id, count = items.len(), "Loaded items for nomenclature");
        Ok((items, lines))
    }

    /// Attaches `supplier` to the current document, persisting the document
    /// if it is new, and points `invoice` at it.
    pub async fn update_current_nomenclature(
        &self,
        supplier: &Supplier,
        nomenclature: &mut Nomenclature,
        invoice: &mut InvoiceStore,
    ) -> AppResult<()> {
        let result: AppResult<()> = async {
            nomenclature.supplier = Ref::to(supplier.clone());
            if nomenclature.id.is_none() {
                self.repository.upsert(&mut *nomenclature).await?;
            }
            invoice.nomenclature = Ref::to(nomenclature.clone());
            Ok(())
        }
        .await;

        audit_failure(
            &self.audit,
            "Update Current Nomenclature Error",
            || format!("Failed to attach supplier {}", supplier.name),
            result,
        )
        .await?;
        info!(supplier = %supplier.name, nomenclature = ?nomenclature.id, "Updated current nomenclature");
        Ok(())
    }

    /// Persists `invoice` with its document number and date. The invoice
    /// stays unposted until [`ArrivalGoodsService::finalize`].
    pub async fn save_invoice(
        &self,
        invoice: &mut InvoiceStore,
        number: i64,
        date: NaiveDate,
    ) -> AppResult<()> {
        let result: AppResult<()> = async {
            invoice.number = number;
            invoice.date = Some(date);
            self.repository.upsert(&mut *invoice).await?;
            Ok(())
        }
        .await;

        audit_failure(
            &self.audit,
            "Save Current Invoice Store Error",
            || format!("Failed to save invoice {}", number),
            result,
        )
        .await?;
        info!(number, invoice = ?invoice.id, "Saved current invoice store");
        Ok(())
    }

    /// Books every intake row against the invoice's document and sets the
    /// invoice total. Returns the total.
    ///
    /// All rows are checked and their items loaded before anything is
    /// written.
    pub async fn process_arrival_lines(
        &self,
        invoice: &mut InvoiceStore,
        intake: &[ItemIntake],
    ) -> AppResult<Money> {
        let items = self.load_intake_items(intake).await?;
        self.book_lines(invoice, items, intake).await
    }

    /// Validates every intake row and loads its item, in row order.
    async fn load_intake_items(&self, intake: &[ItemIntake]) -> AppResult<Vec<Item>> {
        let result: AppResult<Vec<Item>> = async {
            check_intake(intake)?;
            let mut items = Vec::with_capacity(intake.len());
            for row in intake {
                let item = self
                    .repository
                    .find_by_id::<Item>(row.item_id)
                    .await?
                    .into_option()
                    .ok_or_else(|| AppError::not_found("Item", &row.item_id.to_string()))?;
                items.push(item);
            }
            Ok(items)
        }
        .await;

        audit_failure(
            &self.audit,
            "Process Arrival Table Items Error",
            || format!("Failed to load {} arrival lines", intake.len()),
            result,
        )
        .await
    }

    async fn book_lines(
        &self,
        invoice: &mut InvoiceStore,
        items: Vec<Item>,
        intake: &[ItemIntake],
    ) -> AppResult<Money> {
        let result: AppResult<Money> = async {
            let document = invoice.nomenclature.id().ok_or_else(|| {
                AppError::business("The invoice has no arrival document")
            })?;

            let mut total = Money::zero();
            for (mut item, row) in items.into_iter().zip(intake) {
                total += self.book_line(&mut item, row.line, document).await?;
            }
            invoice.final_price = total;
            Ok(total)
        }
        .await;

        let total = audit_failure(
            &self.audit,
            "Process Arrival Table Items Error",
            || format!("Failed to process {} arrival lines", intake.len()),
            result,
        )
        .await?;
        info!(lines = intake.len(), %total, "Processed arrival table items");
        Ok(total)
    }

    /// Updates one item and writes its detail row. Returns the line value.
    async fn book_line(&self, item: &mut Item, line: ArrivalLine, document: i64) -> AppResult<Money> {
        if item.arrival_price != line.arrival_price || item.price != line.price {
            debug!(item = ?item.id, "Arrival changes item prices");
            item.arrival_price = line.arrival_price;
            item.price = line.price;
        }
        item.quantity += line.quantity;
        self.repository.upsert(item).await?;

        let mut detail = NomenclatureDetails {
            nomenclature: Ref::to_id(document),
            item: Ref::to(item.clone()),
            item_quantity: line.quantity,
            item_price: line.arrival_price,
            ..NomenclatureDetails::default()
        };
        self.repository.upsert(&mut detail).await?;

        debug!(item = ?item.id, detail = ?detail.id, "Updated item and nomenclature details");
        Ok(item.arrival_price.multiply_quantity(detail.item_quantity))
    }

    /// Marks the invoice posted and persists it with its total.
    pub async fn finalize(&self, invoice: &mut InvoiceStore) -> AppResult<()> {
        let result: AppResult<()> = async {
            invoice.status = true;
            self.repository.upsert(&mut *invoice).await?;
            Ok(())
        }
        .await;
        if result.is_err() {
            invoice.status = false;
        }

        audit_failure(
            &self.audit,
            "Finalize Invoice Store Error",
            || "Failed to finalize invoice".to_string(),
            result,
        )
        .await?;
        info!(invoice = ?invoice.id, total = %invoice.final_price, "Finalized invoice store");
        Ok(())
    }

    /// Runs the whole posting sequence for an unposted invoice.
    ///
    /// The supplier and every intake item are looked up before anything is
    /// written. The invoice is only posted once all lines are booked.
    pub async fn post_arrival(
        &self,
        supplier_name: &str,
        nomenclature: &mut Nomenclature,
        invoice: &mut InvoiceStore,
        number: i64,
        date: NaiveDate,
        intake: &[ItemIntake],
    ) -> AppResult<Money> {
        if !Self::is_editable(Some(&*invoice)) {
            warn!(invoice = ?invoice.id, "Posted invoice cannot be changed");
            return Err(AppError::business("Invoice is already posted"));
        }
        check_intake(intake)?;

        let supplier = self
            .repository
            .find_one_by_field(Supplier::NAME, supplier_name)
            .await?
            .into_option()
            .ok_or_else(|| AppError::not_found("Supplier", supplier_name))?;
        let items = self.load_intake_items(intake).await?;

        self.update_current_nomenclature(&supplier, nomenclature, invoice)
            .await?;
        self.save_invoice(invoice, number, date).await?;
        let total = self.book_lines(invoice, items, intake).await?;
        self.finalize(invoice).await?;

        self.audit
            .record("Invoice saved", &format!("number {}", number))
            .await;
        Ok(total)
    }
}

fn check_intake(intake: &[ItemIntake]) -> AppResult<()> {
    for row in intake {
        validate_quantity(row.line.quantity)?;
        validate_price("arrival price", row.line.arrival_price)?;
        validate_price("price", row.line.price)?;
    }
    Ok(())
}
