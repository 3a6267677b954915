//! # Withdrawal Repository
//!
//! Database operations for cash withdrawals.
//!
//! Withdrawals are append-only and carry no session reference: the
//! reconciliation engine attributes them by time window alone, which is
//! what lets a withdrawal made while no shift was open still be
//! accounted for in the next opening balance.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use till_core::CashWithdrawal;

/// Repository for withdrawal database operations.
#[derive(Debug, Clone)]
pub struct WithdrawalRepository {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct WithdrawalRow {
    id: String,
    tenant_id: String,
    operator_id: String,
    amount_cents: i64,
    created_at: DateTime<Utc>,
}

impl From<WithdrawalRow> for CashWithdrawal {
    fn from(row: WithdrawalRow) -> Self {
        CashWithdrawal {
            id: row.id,
            tenant_id: row.tenant_id,
            operator_id: row.operator_id,
            amount_cents: row.amount_cents,
            created_at: row.created_at,
        }
    }
}

impl WithdrawalRepository {
    /// Creates a new WithdrawalRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WithdrawalRepository { pool }
    }

    /// Inserts a withdrawal. Rows are immutable once created.
    pub async fn insert(&self, withdrawal: &CashWithdrawal) -> DbResult<()> {
        debug!(
            id = %withdrawal.id,
            operator = %withdrawal.operator_id,
            amount = withdrawal.amount_cents,
            "Inserting withdrawal"
        );

        sqlx::query(
            r#"
            INSERT INTO cash_withdrawals (id, tenant_id, operator_id, amount_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&withdrawal.id)
        .bind(&withdrawal.tenant_id)
        .bind(&withdrawal.operator_id)
        .bind(withdrawal.amount_cents)
        .bind(withdrawal.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Total withdrawn in `[start, end]`, both bounds inclusive.
    ///
    /// This is the shift window: a withdrawal stamped at the exact open
    /// or close instant belongs to the shift.
    pub async fn total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM cash_withdrawals \
             WHERE created_at >= ?1 AND created_at <= ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Total withdrawn in `(start, end]`, exclusive start.
    ///
    /// This is the floating window after a close: a withdrawal stamped
    /// at the exact close instant was already counted by that shift's
    /// reconciliation and must not be counted again.
    pub async fn total_after(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(amount_cents) FROM cash_withdrawals \
             WHERE created_at > ?1 AND created_at <= ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// All withdrawals in `[start, end]`, oldest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<CashWithdrawal>> {
        let rows: Vec<WithdrawalRow> = sqlx::query_as(
            "SELECT id, tenant_id, operator_id, amount_cents, created_at \
             FROM cash_withdrawals \
             WHERE created_at >= ?1 AND created_at <= ?2 \
             ORDER BY created_at",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CashWithdrawal::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
