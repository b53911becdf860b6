//! Posting arrivals end to end.

mod common;

use chrono::NaiveDate;

use sparks_backoffice::services::{ArrivalGoodsService, ArrivalLine, ItemDraft, ItemIntake};
use sparks_backoffice::{AppContext, ErrorCode};
use sparks_core::{InvoiceStore, Item, Money, Nomenclature, Ref};

use common::{memory_context, sqlite_context};

fn may_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn line(quantity: i64, arrival_cents: i64, price_cents: i64) -> ArrivalLine {
    ArrivalLine {
        quantity,
        arrival_price: Money::from_cents(arrival_cents),
        price: Money::from_cents(price_cents),
    }
}

/// Supplier "Acme" plus Milk (5 in stock) and Bread (0 in stock).
async fn stock(ctx: &AppContext) -> (Item, Item) {
    let inventory = ctx.inventory();
    inventory.create_supplier("Acme").await.unwrap();
    let milk = inventory
        .create_item(ItemDraft {
            name: "Milk".into(),
            price: Money::from_cents(199),
            arrival_price: Money::from_cents(99),
            quantity: 5,
            ..ItemDraft::default()
        })
        .await
        .unwrap();
    let bread = inventory
        .create_item(ItemDraft {
            name: "Bread".into(),
            price: Money::from_cents(249),
            arrival_price: Money::from_cents(140),
            quantity: 0,
            ..ItemDraft::default()
        })
        .await
        .unwrap();
    (milk, bread)
}

#[tokio::test]
async fn posting_an_arrival_books_stock_and_totals() {
    let ctx = sqlite_context().await;
    let (milk, bread) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [
        ItemIntake { item_id: milk.id.unwrap(), line: line(10, 120, 219) },
        ItemIntake { item_id: bread.id.unwrap(), line: line(4, 140, 249) },
    ];
    let total = arrival
        .post_arrival("Acme", &mut document, &mut invoice, 12, may_day(), &intake)
        .await
        .unwrap();

    assert_eq!(total, Money::from_cents(10 * 120 + 4 * 140));
    assert_eq!(invoice.final_price, total);
    assert!(invoice.status);
    assert_eq!(invoice.number, 12);
    assert!(document.id.is_some());

    let repo = ctx.repository();
    let milk = repo
        .find_by_id::<Item>(milk.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("milk stored");
    assert_eq!(milk.quantity, 15);
    assert_eq!(milk.arrival_price, Money::from_cents(120));
    assert_eq!(milk.price, Money::from_cents(219));
    let bread = repo
        .find_by_id::<Item>(bread.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("bread stored");
    assert_eq!(bread.quantity, 4);

    let stored = repo
        .find_by_id::<InvoiceStore>(invoice.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("invoice stored");
    assert_eq!(stored.final_price, total);
    assert_eq!(stored.date, Some(may_day()));
    assert_eq!(stored.nomenclature.id(), document.id);

    let actions: Vec<_> = ctx
        .audit()
        .anonymous_entries()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, ["New nomenclature created", "Invoice saved"]);
}

#[tokio::test]
async fn posted_arrivals_can_be_reloaded_by_date() {
    let ctx = sqlite_context().await;
    let (milk, bread) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [
        ItemIntake { item_id: milk.id.unwrap(), line: line(2, 99, 199) },
        ItemIntake { item_id: bread.id.unwrap(), line: line(6, 150, 259) },
    ];
    arrival
        .post_arrival("Acme", &mut document, &mut invoice, 1, may_day(), &intake)
        .await
        .unwrap();

    let documents = arrival.load_nomenclatures(may_day()).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, document.id);
    assert!(documents[0].supplier.is_set());

    let next_day = may_day().succ_opt().unwrap();
    assert!(arrival.load_nomenclatures(next_day).await.unwrap().is_empty());

    let (items, lines) = arrival
        .load_items_for_nomenclature(&documents[0])
        .await
        .unwrap();
    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Milk", "Bread"]);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[1], line(6, 150, 259));
}

#[tokio::test]
async fn lines_of_deleted_items_are_skipped_on_reload() {
    let ctx = sqlite_context().await;
    let (milk, bread) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [
        ItemIntake { item_id: milk.id.unwrap(), line: line(1, 99, 199) },
        ItemIntake { item_id: bread.id.unwrap(), line: line(1, 140, 249) },
    ];
    arrival
        .post_arrival("Acme", &mut document, &mut invoice, 3, may_day(), &intake)
        .await
        .unwrap();

    ctx.inventory().delete_item(milk.id.unwrap()).await.unwrap();

    let (items, lines) = arrival.load_items_for_nomenclature(&document).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Bread");
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn posted_invoice_is_read_only() {
    let ctx = memory_context();
    let (milk, _) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [ItemIntake { item_id: milk.id.unwrap(), line: line(1, 99, 199) }];
    arrival
        .post_arrival("Acme", &mut document, &mut invoice, 7, may_day(), &intake)
        .await
        .unwrap();

    let err = arrival
        .post_arrival("Acme", &mut document, &mut invoice, 7, may_day(), &intake)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);

    let milk = ctx
        .repository()
        .find_by_id::<Item>(milk.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("milk stored");
    assert_eq!(milk.quantity, 6);
}

#[tokio::test]
async fn bad_intake_leaves_the_invoice_untouched() {
    let ctx = memory_context();
    let (milk, _) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [ItemIntake { item_id: milk.id.unwrap(), line: line(-3, 99, 199) }];
    let err = arrival
        .post_arrival("Acme", &mut document, &mut invoice, 8, may_day(), &intake)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(invoice.id.is_none());
    assert!(ArrivalGoodsService::is_editable(Some(&invoice)));

    let err = arrival
        .post_arrival("Nobody", &mut document, &mut invoice, 8, may_day(), &[])
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(document.id.is_none());
}

#[tokio::test]
async fn unknown_item_leaves_the_invoice_unposted() {
    let ctx = memory_context();
    let (milk, _) = stock(&ctx).await;
    let arrival = ctx.arrival();

    let (mut document, mut invoice) = arrival.new_arrival().await;
    let intake = [
        ItemIntake { item_id: milk.id.unwrap(), line: line(2, 99, 199) },
        ItemIntake { item_id: 999, line: line(1, 99, 199) },
    ];
    let err = arrival
        .post_arrival("Acme", &mut document, &mut invoice, 8, may_day(), &intake)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let repo = ctx.repository();
    assert!(invoice.id.is_none());
    assert!(ArrivalGoodsService::is_editable(Some(&invoice)));
    assert!(!repo.find_all::<InvoiceStore>().await.unwrap().is_found());
    assert!(!repo.find_all::<Nomenclature>().await.unwrap().is_found());
    let untouched = repo
        .find_by_id::<Item>(milk.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("milk stored");
    assert_eq!(untouched.quantity, 5);

    // The same invoice can be posted once the row is corrected.
    let intake = [ItemIntake { item_id: milk.id.unwrap(), line: line(2, 99, 199) }];
    let total = arrival
        .post_arrival("Acme", &mut document, &mut invoice, 8, may_day(), &intake)
        .await
        .unwrap();
    assert_eq!(total, Money::from_cents(198));
    assert!(invoice.status);
}

#[tokio::test]
async fn saving_an_invoice_does_not_post_it() {
    let ctx = sqlite_context().await;
    let arrival = ctx.arrival();

    let mut invoice = InvoiceStore::default();
    arrival.save_invoice(&mut invoice, 4, may_day()).await.unwrap();
    let stored = ctx
        .repository()
        .find_by_id::<InvoiceStore>(invoice.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("invoice stored");
    assert!(!stored.status);
    assert_eq!(stored.number, 4);

    arrival.finalize(&mut invoice).await.unwrap();
    let stored = ctx
        .repository()
        .find_by_id::<InvoiceStore>(invoice.id.unwrap())
        .await
        .unwrap()
        .into_option()
        .expect("invoice stored");
    assert!(stored.status);
    assert!(!ArrivalGoodsService::is_editable(Some(&stored)));
}

#[tokio::test]
async fn lines_need_an_arrival_document() {
    let ctx = memory_context();
    let (milk, _) = stock(&ctx).await;

    let mut invoice = InvoiceStore::default();
    let intake = [ItemIntake { item_id: milk.id.unwrap(), line: line(1, 99, 199) }];
    let err = ctx
        .arrival()
        .process_arrival_lines(&mut invoice, &intake)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);

    let mut document = Nomenclature::default();
    ctx.repository().upsert(&mut document).await.unwrap();
    invoice.nomenclature = Ref::to(document);
    let missing = [ItemIntake { item_id: 999, line: line(1, 99, 199) }];
    let err = ctx
        .arrival()
        .process_arrival_lines(&mut invoice, &missing)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);
}
