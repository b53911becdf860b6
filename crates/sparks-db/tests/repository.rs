//! Facade behavior against both row stores.

mod common;

use chrono::NaiveDate;
use sparks_core::{
    Category, Entity, InvoiceStore, Item, Money, Nomenclature, NomenclatureDetails, Ref, Supplier,
};
use sparks_db::{DbError, Repository};

use common::{both_repos, category, item, sqlite_repo};

#[tokio::test]
async fn upsert_assigns_identity_and_find_by_id_returns_it() {
    for (engine, repo) in both_repos().await {
        let dairy = category(&repo, "Dairy").await;
        let milk = item(&repo, "Milk", &dairy, 199).await;
        assert!(milk.id.is_some(), "{engine}");

        let loaded = repo
            .find_by_id::<Item>(milk.id.unwrap())
            .await
            .unwrap()
            .into_option()
            .expect(engine);
        assert_eq!(loaded, milk, "{engine}");
        assert_eq!(loaded.price, Money::from_cents(199), "{engine}");
    }
}

#[tokio::test]
async fn double_upsert_leaves_one_row() {
    for (engine, repo) in both_repos().await {
        let mut supplier = Supplier::new("Acme");
        let first = repo.upsert(&mut supplier).await.unwrap();
        let second = repo.upsert(&mut supplier).await.unwrap();
        assert_eq!(first, second, "{engine}");

        let all = repo.find_all::<Supplier>().await.unwrap().into_value();
        assert_eq!(all.len(), 1, "{engine}");
    }
}

#[tokio::test]
async fn upsert_updates_changed_fields() {
    for (engine, repo) in both_repos().await {
        let dairy = category(&repo, "Dairy").await;
        let mut milk = item(&repo, "Milk", &dairy, 199).await;

        milk.quantity = 42;
        milk.name = "Whole milk".to_string();
        repo.upsert(&mut milk).await.unwrap();

        let loaded = repo
            .find_by_id::<Item>(milk.id.unwrap())
            .await
            .unwrap()
            .into_option()
            .unwrap();
        assert_eq!(loaded.quantity, 42, "{engine}");
        assert_eq!(loaded.name, "Whole milk", "{engine}");
    }
}

#[tokio::test]
async fn upsert_of_deleted_row_is_not_found() {
    for (engine, repo) in both_repos().await {
        let mut supplier = Supplier::new("Gone");
        let id = repo.upsert(&mut supplier).await.unwrap();
        assert!(repo.delete_by_id::<Supplier>(id).await.unwrap());

        let err = repo.upsert(&mut supplier).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }), "{engine}: {err}");
        assert!(repo.find_all::<Supplier>().await.unwrap().into_value().is_empty());
    }
}

#[tokio::test]
async fn no_match_yields_empty_payloads() {
    for (engine, repo) in both_repos().await {
        let one = repo
            .find_one_by_field(Category::NAME, "Nothing")
            .await
            .unwrap();
        assert!(!one.is_found(), "{engine}");
        assert!(one.value().is_none(), "{engine}");

        let many = repo
            .find_all_by_field(Category::NAME, "Nothing")
            .await
            .unwrap();
        assert!(!many.is_found(), "{engine}");
        assert!(many.value().is_empty(), "{engine}");

        let by_id = repo.find_by_id::<Category>(999).await.unwrap();
        assert_eq!(by_id.into_parts(), (false, None), "{engine}");
    }
}

#[tokio::test]
async fn find_all_by_field_orders_by_insertion() {
    for (engine, repo) in both_repos().await {
        let dairy = category(&repo, "Dairy").await;
        let bakery = category(&repo, "Bakery").await;
        let milk = item(&repo, "Milk", &dairy, 199).await;
        item(&repo, "Bread", &bakery, 250).await;
        let cheese = item(&repo, "Cheese", &dairy, 599).await;

        let dairy_items = repo
            .find_all_by_field(Item::CATEGORY, dairy.id)
            .await
            .unwrap();
        assert!(dairy_items.is_found(), "{engine}");
        let ids: Vec<_> = dairy_items.value().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![milk.id, cheese.id], "{engine}");
    }
}

#[tokio::test]
async fn null_lookup_matches_unset_references() {
    for (engine, repo) in both_repos().await {
        let mut loose = Item::new("Loose", Ref::none());
        repo.upsert(&mut loose).await.unwrap();
        let dairy = category(&repo, "Dairy").await;
        item(&repo, "Milk", &dairy, 199).await;

        let uncategorized = repo
            .find_all_by_field(Item::CATEGORY, None::<i64>)
            .await
            .unwrap()
            .into_value();
        assert_eq!(uncategorized.len(), 1, "{engine}");
        assert_eq!(uncategorized[0].name, "Loose", "{engine}");
    }
}

#[tokio::test]
async fn find_with_joins_resolves_associations() {
    for (engine, repo) in both_repos().await {
        let mut acme = Supplier::new("Acme");
        repo.upsert(&mut acme).await.unwrap();
        let mut document = Nomenclature {
            supplier: Ref::to(acme.clone()),
            ..Nomenclature::default()
        };
        repo.upsert(&mut document).await.unwrap();

        let dairy = category(&repo, "Dairy").await;
        let milk = item(&repo, "Milk", &dairy, 199).await;
        let cheese = item(&repo, "Cheese", &dairy, 599).await;

        for (line_item, qty) in [(&milk, 3), (&cheese, 1)] {
            let mut line = NomenclatureDetails {
                nomenclature: Ref::to(document.clone()),
                item: Ref::to(line_item.clone()),
                item_quantity: qty,
                item_price: line_item.arrival_price,
                ..NomenclatureDetails::default()
            };
            repo.upsert(&mut line).await.unwrap();
        }

        let lines = repo
            .find_with_joins(
                NomenclatureDetails::NOMENCLATURE,
                document.id,
                &["nomenclature", "item"],
            )
            .await
            .unwrap();
        assert!(lines.is_found(), "{engine}");

        let lines = lines.into_value();
        assert_eq!(lines.len(), 2, "{engine}");
        for line in &lines {
            assert_eq!(line.nomenclature.get().and_then(|n| n.id), document.id, "{engine}");
            // Nested associations are not followed.
            assert!(!line.nomenclature.get().unwrap().supplier.is_resolved());
        }
        assert_eq!(lines[0].item.get(), Some(&milk), "{engine}");
        assert_eq!(lines[1].item.get(), Some(&cheese), "{engine}");
    }
}

#[tokio::test]
async fn find_all_with_joins_resolves_every_row() {
    for (engine, repo) in both_repos().await {
        let dairy = category(&repo, "Dairy").await;
        let milk = item(&repo, "Milk", &dairy, 199).await;
        let mut loose = Item::new("Loose Candy", Ref::none());
        repo.upsert(&mut loose).await.unwrap();

        let items = repo
            .find_all_with_joins::<Item>(&["category"])
            .await
            .unwrap()
            .into_value();
        assert_eq!(items.len(), 2, "{engine}");
        assert_eq!(items[0].id, milk.id, "{engine}");
        assert_eq!(items[0].category.get(), Some(&dairy), "{engine}");
        assert!(!items[1].category.is_set(), "{engine}");

        let empty = repo
            .find_all_with_joins::<Nomenclature>(&["supplier"])
            .await
            .unwrap();
        assert!(!empty.is_found(), "{engine}");
    }
}

#[tokio::test]
async fn invoices_are_found_by_date() {
    for (engine, repo) in both_repos().await {
        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut document = Nomenclature::default();
        repo.upsert(&mut document).await.unwrap();

        for (number, date) in [(1, may_first), (2, may_first.succ_opt().unwrap())] {
            let mut invoice = InvoiceStore {
                number,
                date: Some(date),
                nomenclature: Ref::to(document.clone()),
                ..InvoiceStore::default()
            };
            repo.upsert(&mut invoice).await.unwrap();
        }

        let found = repo
            .find_with_joins(InvoiceStore::DATE, may_first, &["nomenclature"])
            .await
            .unwrap()
            .into_value();
        assert_eq!(found.len(), 1, "{engine}");
        assert_eq!(found[0].number, 1, "{engine}");
        assert!(found[0].nomenclature.is_resolved(), "{engine}");
        assert!(!found[0].status, "{engine}");
    }
}

#[tokio::test]
async fn delete_by_id_reports_missing_rows() {
    for (engine, repo) in both_repos().await {
        assert!(!repo.delete_by_id::<Category>(12345).await.unwrap(), "{engine}");

        let spare = category(&repo, "Spare").await;
        assert!(repo.delete_by_id::<Category>(spare.id.unwrap()).await.unwrap());
        assert!(!repo.find_by_id::<Category>(spare.id.unwrap()).await.unwrap().is_found());
    }
}

#[tokio::test]
async fn unique_constraint_surfaces_as_error() {
    let repo: Repository = sqlite_repo().await;
    category(&repo, "Dairy").await;

    let mut duplicate = Category::new("Dairy");
    let err = repo.upsert(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, DbError::UniqueViolation { .. }), "{err}");
    assert!(duplicate.id().is_none());
}

#[tokio::test]
async fn closed_repository_fails_with_connection_error() {
    for (engine, repo) in both_repos().await {
        repo.close().await;
        assert!(!repo.health_check().await, "{engine}");

        let err = repo.find_all::<Category>().await.unwrap_err();
        assert!(matches!(err, DbError::ConnectionFailed(_)), "{engine}: {err}");
    }
}
