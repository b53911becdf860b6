//! Deleting referenced rows: disconnect first, then delete.

mod common;

use sparks_core::{Item, Money, Nomenclature, NomenclatureDetails, Ref, TransactionDetail};
use sparks_db::{DbError, MemoryStore, Repository};

use common::{category, item, memory_repo, sqlite_repo};

/// Item #7 plus two arrival lines and one sale line that point at it.
async fn referenced_item(repo: &Repository) -> (Item, Vec<i64>, i64) {
    let dairy = category(repo, "Dairy").await;
    let milk = item(repo, "Milk", &dairy, 199).await;

    let mut document = Nomenclature::default();
    repo.upsert(&mut document).await.unwrap();

    let mut line_ids = Vec::new();
    for qty in [3, 5] {
        let mut line = NomenclatureDetails {
            nomenclature: Ref::to(document.clone()),
            item: Ref::to(milk.clone()),
            item_quantity: qty,
            item_price: Money::from_cents(100),
            ..NomenclatureDetails::default()
        };
        line_ids.push(repo.upsert(&mut line).await.unwrap());
    }

    let mut sale = TransactionDetail {
        item: Ref::to(milk.clone()),
        quantity: 1,
        price: milk.price,
        ..TransactionDetail::default()
    };
    let sale_id = repo.upsert(&mut sale).await.unwrap();

    (milk, line_ids, sale_id)
}

fn item_dependents() -> [sparks_core::FieldRef; 2] {
    [NomenclatureDetails::ITEM.erase(), TransactionDetail::ITEM.erase()]
}

#[tokio::test]
async fn referenced_row_cannot_be_deleted_before_disconnect() {
    let repo = sqlite_repo().await;
    let (milk, _, _) = referenced_item(&repo).await;

    let err = repo.delete_by_id::<Item>(milk.id.unwrap()).await.unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "{err}");
    assert!(repo.find_by_id::<Item>(milk.id.unwrap()).await.unwrap().is_found());
}

#[tokio::test]
async fn memory_store_deletes_referenced_rows_without_checks() {
    let repo = memory_repo();
    let (milk, line_ids, _) = referenced_item(&repo).await;

    assert!(repo.delete_by_id::<Item>(milk.id.unwrap()).await.unwrap());

    // The arrival line still names the item, and joins leave it unresolved.
    let lines = repo
        .find_with_joins(NomenclatureDetails::ITEM, milk.id, &["item"])
        .await
        .unwrap()
        .into_value();
    assert_eq!(lines.len(), line_ids.len());
    assert!(lines.iter().all(|l| l.item.is_set() && !l.item.is_resolved()));
}

#[tokio::test]
async fn disconnect_then_delete_keeps_dependents() {
    let repo = sqlite_repo().await;
    let (milk, line_ids, sale_id) = referenced_item(&repo).await;

    let cleared = repo.cascade_disconnect(&milk, &item_dependents()).await.unwrap();
    assert_eq!(cleared, 3);

    assert!(repo.delete_by_id::<Item>(milk.id.unwrap()).await.unwrap());
    assert!(!repo.find_by_id::<Item>(milk.id.unwrap()).await.unwrap().is_found());

    for id in line_ids {
        let line = repo
            .find_by_id::<NomenclatureDetails>(id)
            .await
            .unwrap()
            .into_option()
            .expect("arrival line survives");
        assert!(!line.item.is_set());
        assert!(line.nomenclature.is_set());
    }
    let sale = repo
        .find_by_id::<TransactionDetail>(sale_id)
        .await
        .unwrap()
        .into_option()
        .expect("sale line survives");
    assert!(!sale.item.is_set());
    assert_eq!(sale.price, Money::from_cents(199));
}

#[tokio::test]
async fn cascade_is_idempotent() {
    let repo = memory_repo();
    let (milk, _, _) = referenced_item(&repo).await;

    assert_eq!(repo.cascade_disconnect(&milk, &item_dependents()).await.unwrap(), 3);
    assert_eq!(repo.cascade_disconnect(&milk, &item_dependents()).await.unwrap(), 0);
}

#[tokio::test]
async fn cascade_leaves_other_targets_alone() {
    let repo = sqlite_repo().await;
    let (milk, _, _) = referenced_item(&repo).await;
    let dairy = repo
        .find_by_id::<sparks_core::Category>(milk.category.id().unwrap())
        .await
        .unwrap()
        .into_option()
        .unwrap();
    let cheese = item(&repo, "Cheese", &dairy, 599).await;
    let mut cheese_sale = TransactionDetail {
        item: Ref::to(cheese.clone()),
        quantity: 2,
        ..TransactionDetail::default()
    };
    repo.upsert(&mut cheese_sale).await.unwrap();

    repo.cascade_disconnect(&milk, &item_dependents()).await.unwrap();

    let still_linked = repo
        .find_all_by_field(TransactionDetail::ITEM, cheese.id)
        .await
        .unwrap()
        .into_value();
    assert_eq!(still_linked.len(), 1);
}

#[tokio::test]
async fn disconnect_and_delete_in_one_step() {
    for repo in [sqlite_repo().await, memory_repo()] {
        let (milk, line_ids, _) = referenced_item(&repo).await;

        assert!(repo
            .disconnect_and_delete::<Item>(milk.id.unwrap(), &item_dependents())
            .await
            .unwrap());
        assert!(!repo.find_by_id::<Item>(milk.id.unwrap()).await.unwrap().is_found());

        let line = repo
            .find_by_id::<NomenclatureDetails>(line_ids[0])
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert!(!line.item.is_set());

        // Already gone: nothing to disconnect, nothing to delete.
        assert!(!repo
            .disconnect_and_delete::<Item>(milk.id.unwrap(), &item_dependents())
            .await
            .unwrap());
    }
}

#[tokio::test]
async fn failed_atomic_unit_changes_nothing() {
    let repo = sqlite_repo().await;
    let (milk, line_ids, _) = referenced_item(&repo).await;

    // Only arrival lines are disconnected; the sale line still blocks the
    // delete, so the whole unit rolls back.
    let err = repo
        .disconnect_and_delete::<Item>(milk.id.unwrap(), &[NomenclatureDetails::ITEM.erase()])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "{err}");

    let line = repo
        .find_by_id::<NomenclatureDetails>(line_ids[0])
        .await
        .unwrap()
        .into_option()
        .unwrap();
    assert_eq!(line.item.id(), milk.id);
    assert!(repo.find_by_id::<Item>(milk.id.unwrap()).await.unwrap().is_found());
}

#[tokio::test]
async fn memory_store_counts_rows_per_table() {
    let store = std::sync::Arc::new(MemoryStore::new());
    let repo = Repository::new(store.clone());
    let (milk, _, _) = referenced_item(&repo).await;

    assert_eq!(store.row_count("nomenclature_details").await, 2);
    repo.disconnect_and_delete::<Item>(milk.id.unwrap(), &item_dependents())
        .await
        .unwrap();
    assert_eq!(store.row_count("items").await, 0);
    assert_eq!(store.row_count("transaction_details").await, 1);
}
