//! # Sales Reader
//!
//! Read-only access to the sales stream.
//!
//! The sales table is owned by the sales module; this subsystem never
//! writes it. Everything here is a time-window query: reconciliation
//! needs cash totals over shift and gap windows, the dashboard needs
//! per-method totals and a daily series.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::DbResult;
use till_core::{PaymentMethod, SaleRecord};

/// Read-only query collaborator over completed sales.
#[derive(Debug, Clone)]
pub struct SaleReader {
    pool: SqlitePool,
}

#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    tenant_id: String,
    method: PaymentMethod,
    total_cents: i64,
    sold_at: DateTime<Utc>,
}

impl From<SaleRow> for SaleRecord {
    fn from(row: SaleRow) -> Self {
        SaleRecord {
            id: row.id,
            tenant_id: row.tenant_id,
            method: row.method,
            total_cents: row.total_cents,
            sold_at: row.sold_at,
        }
    }
}

impl SaleReader {
    /// Creates a new SaleReader.
    pub fn new(pool: SqlitePool) -> Self {
        SaleReader { pool }
    }

    /// Sales in `[start, end]`, optionally restricted to one payment
    /// method, oldest first.
    pub async fn sales_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        method: Option<PaymentMethod>,
    ) -> DbResult<Vec<SaleRecord>> {
        let rows: Vec<SaleRow> = match method {
            Some(method) => {
                sqlx::query_as(
                    "SELECT id, tenant_id, method, total_cents, sold_at FROM sales \
                     WHERE sold_at >= ?1 AND sold_at <= ?2 AND method = ?3 \
                     ORDER BY sold_at",
                )
                .bind(start)
                .bind(end)
                .bind(method)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, tenant_id, method, total_cents, sold_at FROM sales \
                     WHERE sold_at >= ?1 AND sold_at <= ?2 \
                     ORDER BY sold_at",
                )
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(SaleRecord::from).collect())
    }

    /// Total of cash-method sales in `[start, end]`, both bounds
    /// inclusive (the shift window).
    pub async fn cash_total_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM sales \
             WHERE method = ?1 AND sold_at >= ?2 AND sold_at <= ?3",
        )
        .bind(PaymentMethod::Cash)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }

    /// Total of cash-method sales in `(start, end]`, exclusive start
    /// (the floating window after a close).
    pub async fn cash_total_after(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> DbResult<i64> {
        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total_cents) FROM sales \
             WHERE method = ?1 AND sold_at > ?2 AND sold_at <= ?3",
        )
        .bind(PaymentMethod::Cash)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
