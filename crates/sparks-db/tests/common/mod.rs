//! Shared fixtures for the storage integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use sparks_core::{Category, Item, Money, Ref};
use sparks_db::{Database, DbConfig, MemoryStore, Repository};

/// A repository over a fresh, migrated in-memory SQLite database.
pub async fn sqlite_repo() -> Repository {
    let db = Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database");
    db.repository()
}

pub fn memory_repo() -> Repository {
    Repository::new(Arc::new(MemoryStore::new()))
}

/// Both engines, so behavior can be checked to match.
pub async fn both_repos() -> Vec<(&'static str, Repository)> {
    vec![("sqlite", sqlite_repo().await), ("memory", memory_repo())]
}

pub async fn category(repo: &Repository, name: &str) -> Category {
    let mut category = Category::new(name);
    repo.upsert(&mut category).await.expect("insert category");
    category
}

pub async fn item(repo: &Repository, name: &str, category: &Category, price_cents: i64) -> Item {
    let mut item = Item::new(name, Ref::to(category.clone()));
    item.price = Money::from_cents(price_cents);
    item.arrival_price = Money::from_cents(price_cents / 2);
    item.quantity = 10;
    repo.upsert(&mut item).await.expect("insert item");
    item
}
