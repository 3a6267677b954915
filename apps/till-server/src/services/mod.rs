//! # Service Layer
//!
//! Orchestration between the HTTP surface and the store.
//!
//! - [`session`] - shift lifecycle and the concurrency guard
//! - [`reconcile`] - the reconciliation calculator over the store
//! - [`withdrawal`] - the withdrawal ledger
//! - [`dashboard`] - read-side aggregations and history
//!
//! Services own the clock: each operation snaps `Utc::now()` once and
//! threads it through every window computation. till-core below them
//! never reads the clock; till-db below them never decides policy.

pub mod dashboard;
pub mod reconcile;
pub mod session;
pub mod withdrawal;

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testutil {
    use chrono::{DateTime, TimeZone, Utc};
    use till_core::DEFAULT_TENANT_ID;
    use till_db::{Database, DbConfig};
    use uuid::Uuid;

    /// Fresh in-memory database with migrations applied.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Fixed instant inside the test trading day.
    pub fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, h, m, 0).unwrap()
    }

    /// Registers an operator in the user-directory projection.
    pub async fn seed_user(db: &Database, id: &str, name: &str, role: &str) {
        sqlx::query(
            "INSERT INTO users (id, tenant_id, name, role, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
        )
        .bind(id)
        .bind(DEFAULT_TENANT_ID)
        .bind(name)
        .bind(role)
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();
    }

    /// Appends a sale to the external sales stream.
    pub async fn seed_sale(db: &Database, method: &str, total_cents: i64, at: DateTime<Utc>) {
        sqlx::query(
            "INSERT INTO sales (id, tenant_id, method, total_cents, sold_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(DEFAULT_TENANT_ID)
        .bind(method)
        .bind(total_cents)
        .bind(at)
        .execute(db.pool())
        .await
        .unwrap();
    }

    /// Appends a withdrawal with an explicit timestamp.
    pub async fn seed_withdrawal(db: &Database, operator: &str, amount_cents: i64, at: DateTime<Utc>) {
        sqlx::query(
            "INSERT INTO cash_withdrawals (id, tenant_id, operator_id, amount_cents, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(DEFAULT_TENANT_ID)
        .bind(operator)
        .bind(amount_cents)
        .bind(at)
        .execute(db.pool())
        .await
        .unwrap();
    }
}
