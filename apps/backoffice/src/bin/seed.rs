//! # Seed Data Generator
//!
//! Populates a back office database for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database (SPARKS_DB_PATH or the platform default)
//! cargo run -p sparks-backoffice --bin sparks-seed
//!
//! # Specify database path and manager account
//! cargo run -p sparks-backoffice --bin sparks-seed -- --db ./sparks_dev.db \
//!     --email admin@sparks.local --password admin
//! ```
//!
//! ## Generated Data
//! - Categories with a handful of items each (prices in cents)
//! - Suppliers
//! - One manager account

use std::env;
use std::path::PathBuf;

use sparks_backoffice::services::ItemDraft;
use sparks_backoffice::{AppConfig, AppContext};
use sparks_core::{EmployeeRole, Item, Money};

/// Categories and their items: (name, price cents, arrival price cents).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Dairy",
        &[
            ("Milk 1L", 199, 120),
            ("Butter 250g", 349, 230),
            ("Yogurt", 99, 55),
            ("Cheddar 200g", 459, 300),
        ],
    ),
    (
        "Bakery",
        &[
            ("White Bread", 249, 140),
            ("Croissant", 129, 60),
            ("Rye Bread", 289, 170),
        ],
    ),
    (
        "Beverages",
        &[
            ("Orange Juice 1L", 299, 180),
            ("Mineral Water 0.5L", 79, 30),
            ("Cola 2L", 259, 150),
        ],
    ),
];

const SUPPLIERS: &[&str] = &["Acme Foods", "North Dairy Co", "City Bakery"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut email = String::from("admin@sparks.local");
    let mut password = String::from("admin");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--email" | "-e" => {
                if i + 1 < args.len() {
                    email = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sparks Back Office Seed Data Generator");
                println!();
                println!("Usage: sparks-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: configured path)");
                println!("  -e, --email <EMAIL>      Manager login (default: admin@sparks.local)");
                println!("  -p, --password <PASS>    Manager password (default: admin)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load()?;
    if let Some(path) = db_path {
        config.database_path = path;
    }
    sparks_backoffice::init_tracing("warn");

    println!("Sparks Back Office Seed Data Generator");
    println!("======================================");
    println!("Database: {}", config.database_path.display());
    println!();

    let context = AppContext::connect(&config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = context.repository().find_all::<Item>().await?.into_value().len();
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let inventory = context.inventory();
    for name in SUPPLIERS {
        inventory.create_supplier(name).await?;
    }
    println!("✓ Created {} suppliers", SUPPLIERS.len());

    let mut generated = 0;
    for (category, items) in CATALOG {
        inventory.create_category(category).await?;
        for (index, (name, price, arrival_price)) in items.iter().enumerate() {
            let draft = ItemDraft {
                name: name.to_string(),
                category: Some(category.to_string()),
                price: Money::from_cents(*price),
                arrival_price: Money::from_cents(*arrival_price),
                quantity: 10 + (index as i64 * 7) % 40,
            };
            if let Err(e) = inventory.create_item(draft).await {
                eprintln!("Failed to insert {}: {}", name, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ Created {} categories, {} items", CATALOG.len(), generated);

    let manager = context
        .login()
        .register("Manager", &email, &password, EmployeeRole::Manager)
        .await?;
    println!("✓ Created manager {} (id {:?})", manager.email, manager.id);

    context.close().await;
    println!();
    println!("✓ Seed complete!");
    Ok(())
}
