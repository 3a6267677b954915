//! # Reconciliation Service
//!
//! The reconciliation calculator wired to the store: fetches window
//! sums through the repositories and delegates the arithmetic to
//! till-core.
//!
//! Every public method takes the reference instant as a parameter
//! instead of reading the clock, so one close (or one dashboard
//! computation) sums all of its windows against a single frozen
//! timestamp.

use chrono::{DateTime, Utc};

use till_core::money::Money;
use till_core::reconcile;
use till_core::{CashSession, ShiftActivity};
use till_db::Database;

use crate::error::ApiError;

/// Reconciliation calculator over the session/sales/withdrawal stores.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    db: Database,
}

impl Reconciliation {
    pub fn new(db: Database) -> Self {
        Reconciliation { db }
    }

    /// Cash on hand at `now`, i.e. the opening balance a shift opened
    /// at `now` would start with.
    ///
    /// Anchored on the most recently closed session: its counted
    /// closing cash plus the floating activity in `(closed_at, now]`.
    /// With no closed session on record the drawer history starts at
    /// zero.
    pub async fn opening_balance(&self, now: DateTime<Utc>) -> Result<Money, ApiError> {
        let last = match self.db.sessions().find_last_closed().await? {
            Some(session) => session,
            None => return Ok(Money::zero()),
        };

        let figures = match last.closing() {
            Some(figures) => *figures,
            // find_last_closed only returns closed rows; a miss here is
            // a corrupt store, not a business case.
            None => {
                return Err(ApiError::internal(
                    "last closed session is missing closing figures",
                ))
            }
        };

        let floating = self.floating_activity(figures.closed_at, now).await?;

        Ok(reconcile::opening_balance(
            Money::from_cents(figures.actual_cents),
            floating,
        ))
    }

    /// Expected cash at `close_time` for the given open session.
    pub async fn theoretical_closing(
        &self,
        session: &CashSession,
        close_time: DateTime<Utc>,
    ) -> Result<Money, ApiError> {
        let activity = self.shift_activity(session.opened_at, close_time).await?;
        Ok(reconcile::theoretical_closing(session.opening(), activity))
    }

    /// Cash movement over a shift window `[opened_at, until]`, both
    /// bounds inclusive.
    pub async fn shift_activity(
        &self,
        opened_at: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<ShiftActivity, ApiError> {
        let cash_sales = self.db.sales().cash_total_between(opened_at, until).await?;
        let withdrawals = self
            .db
            .withdrawals()
            .total_between(opened_at, until)
            .await?;

        Ok(ShiftActivity::new(
            Money::from_cents(cash_sales),
            Money::from_cents(withdrawals),
        ))
    }

    /// Cash movement over a gap window `(closed_at, until]`, exclusive
    /// start so the close-instant boundary is never double counted.
    pub async fn floating_activity(
        &self,
        closed_at: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<ShiftActivity, ApiError> {
        let cash_sales = self.db.sales().cash_total_after(closed_at, until).await?;
        let withdrawals = self.db.withdrawals().total_after(closed_at, until).await?;

        Ok(ShiftActivity::new(
            Money::from_cents(cash_sales),
            Money::from_cents(withdrawals),
        ))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{seed_sale, seed_user, seed_withdrawal, test_db, ts};
    use till_core::{CashSession, ClosingFigures, SessionState, DEFAULT_TENANT_ID};

    fn open_session(operator: &str, opened_at: DateTime<Utc>, opening_cents: i64) -> CashSession {
        CashSession {
            id: "s-test".to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            operator_id: operator.to_string(),
            opened_at,
            opening_cents,
            stock_control_done: false,
            state: SessionState::Open,
        }
    }

    #[tokio::test]
    async fn test_opening_balance_without_history_is_zero() {
        let db = test_db().await;
        let calc = Reconciliation::new(db);

        let balance = calc.opening_balance(ts(12, 0)).await.unwrap();
        assert_eq!(balance, Money::zero());
    }

    #[tokio::test]
    async fn test_opening_balance_folds_floating_activity() {
        let db = test_db().await;
        seed_user(&db, "op-b", "Bob", "cashier").await;

        // A closed shift that counted 300.00 at 10:00.
        let session = open_session("op-b", ts(8, 0), 0);
        db.sessions().insert_open(&session).await.unwrap();
        db.sessions()
            .close(
                &session.id,
                &ClosingFigures {
                    closed_at: ts(10, 0),
                    theoretical_cents: 30_000,
                    actual_cents: 30_000,
                    variance_cents: 0,
                },
            )
            .await
            .unwrap();

        // After the close: one cash sale of 50.00, one withdrawal of
        // 20.00 => next opening balance 330.00.
        seed_sale(&db, "cash", 5_000, ts(10, 30)).await;
        seed_withdrawal(&db, "op-b", 2_000, ts(11, 0)).await;

        let calc = Reconciliation::new(db);
        let balance = calc.opening_balance(ts(12, 0)).await.unwrap();
        assert_eq!(balance.cents(), 33_000);
    }

    #[tokio::test]
    async fn test_opening_balance_excludes_close_instant_activity() {
        let db = test_db().await;
        seed_user(&db, "op-b", "Bob", "cashier").await;

        let session = open_session("op-b", ts(8, 0), 0);
        db.sessions().insert_open(&session).await.unwrap();
        db.sessions()
            .close(
                &session.id,
                &ClosingFigures {
                    closed_at: ts(10, 0),
                    theoretical_cents: 10_000,
                    actual_cents: 10_000,
                    variance_cents: 0,
                },
            )
            .await
            .unwrap();

        // Stamped exactly at the close instant: already reconciled by
        // the closed shift, must not float into the next opening.
        seed_sale(&db, "cash", 9_999, ts(10, 0)).await;

        let calc = Reconciliation::new(db);
        let balance = calc.opening_balance(ts(12, 0)).await.unwrap();
        assert_eq!(balance.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_theoretical_closing_includes_both_boundaries() {
        let db = test_db().await;
        seed_user(&db, "op-b", "Bob", "cashier").await;

        // Sales at the exact open and close instants both count.
        seed_sale(&db, "cash", 1_000, ts(8, 0)).await;
        seed_sale(&db, "cash", 2_000, ts(12, 0)).await;
        // Card sales never touch the drawer.
        seed_sale(&db, "external_card", 50_000, ts(9, 0)).await;
        seed_withdrawal(&db, "op-b", 500, ts(10, 0)).await;

        let session = open_session("op-b", ts(8, 0), 100_000);
        let calc = Reconciliation::new(db);

        let theoretical = calc
            .theoretical_closing(&session, ts(12, 0))
            .await
            .unwrap();
        assert_eq!(theoretical.cents(), 100_000 + 1_000 + 2_000 - 500);
    }
}
