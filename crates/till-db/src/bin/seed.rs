//! # Seed Data Generator
//!
//! Populates the database with development data for the drawer engine.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p till-db --bin seed
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Data
//! - A manager and two cashiers
//! - A spread of cash and card sales across the current day
//! - One withdrawal, so the dashboard has something to subtract

use chrono::{Duration, Utc};
use std::env;
use till_core::DEFAULT_TENANT_ID;
use till_db::{Database, DbConfig};
use uuid::Uuid;

const OPERATORS: &[(&str, &str, &str)] = &[
    ("00000000-0000-0000-0000-00000000000a", "Alice Romero", "manager"),
    ("00000000-0000-0000-0000-00000000000b", "Bob Tanaka", "cashier"),
    ("00000000-0000-0000-0000-00000000000c", "Carol Mwangi", "cashier"),
];

// (method, total_cents, minutes ago)
const SALES: &[(&str, i64, i64)] = &[
    ("cash", 1_250, 470),
    ("cash", 4_980, 430),
    ("external_card", 12_300, 395),
    ("cash", 750, 340),
    ("external_card", 2_200, 290),
    ("cash", 9_999, 245),
    ("cash", 3_405, 180),
    ("external_card", 5_650, 120),
    ("cash", 2_100, 60),
    ("cash", 880, 15),
];

#[tokio::main]
async fn main() {
    let mut db_path = "./till.db".to_string();

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        if args[i] == "--db" && i + 1 < args.len() {
            db_path = args[i + 1].clone();
            i += 2;
        } else {
            eprintln!("Unknown argument: {}", args[i]);
            std::process::exit(1);
        }
    }

    println!("Seeding {db_path}");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let now = Utc::now();

    for (id, name, role) in OPERATORS {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO users (id, tenant_id, name, role, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        )
        .bind(id)
        .bind(DEFAULT_TENANT_ID)
        .bind(name)
        .bind(role)
        .bind(now)
        .execute(db.pool())
        .await;

        if let Err(e) = result {
            eprintln!("Failed to seed user {name}: {e}");
            std::process::exit(1);
        }
    }
    println!("  {} operators", OPERATORS.len());

    for (method, total_cents, minutes_ago) in SALES {
        let result = sqlx::query(
            "INSERT INTO sales (id, tenant_id, method, total_cents, sold_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(DEFAULT_TENANT_ID)
        .bind(method)
        .bind(total_cents)
        .bind(now - Duration::minutes(*minutes_ago))
        .execute(db.pool())
        .await;

        if let Err(e) = result {
            eprintln!("Failed to seed sale: {e}");
            std::process::exit(1);
        }
    }
    println!("  {} sales", SALES.len());

    let result = sqlx::query(
        "INSERT INTO cash_withdrawals (id, tenant_id, operator_id, amount_cents, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(DEFAULT_TENANT_ID)
    .bind(OPERATORS[1].0)
    .bind(5_000_i64)
    .bind(now - Duration::minutes(200))
    .execute(db.pool())
    .await;

    if let Err(e) = result {
        eprintln!("Failed to seed withdrawal: {e}");
        std::process::exit(1);
    }
    println!("  1 withdrawal");

    db.close().await;
    println!("Done.");
}
