//! # Withdrawal Service
//!
//! Records cash taken out of the drawer.
//!
//! A withdrawal is a single immutable row stamped with the server
//! clock. It is valid with or without an open shift — reconciliation
//! attributes it by timestamp, so money removed between shifts is
//! still settled in the next opening balance.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use till_core::money::Money;
use till_core::validation::validate_withdrawal_amount;
use till_core::{CashWithdrawal, CoreError, DEFAULT_TENANT_ID};
use till_db::Database;

use crate::error::ApiError;

/// Withdrawal ledger service.
#[derive(Debug, Clone)]
pub struct WithdrawalService {
    db: Database,
}

impl WithdrawalService {
    pub fn new(db: Database) -> Self {
        WithdrawalService { db }
    }

    /// Records a withdrawal for the operator.
    ///
    /// The amount must be strictly positive; the row is immutable once
    /// written.
    pub async fn record(
        &self,
        operator_id: &str,
        amount_cents: i64,
    ) -> Result<CashWithdrawal, ApiError> {
        debug!(operator = %operator_id, amount = amount_cents, "record withdrawal");

        validate_withdrawal_amount(Money::from_cents(amount_cents)).map_err(CoreError::from)?;

        let operator = self
            .db
            .users()
            .get(operator_id)
            .await?
            .ok_or_else(|| CoreError::OperatorNotFound(operator_id.to_string()))?;

        let withdrawal = CashWithdrawal {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            operator_id: operator.id.clone(),
            amount_cents,
            created_at: Utc::now(),
        };

        self.db.withdrawals().insert(&withdrawal).await?;

        info!(
            id = %withdrawal.id,
            operator = %operator.name,
            amount = %withdrawal.amount(),
            "Withdrawal recorded"
        );

        Ok(withdrawal)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
