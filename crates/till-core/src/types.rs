//! # Domain Types
//!
//! Core domain types for the cash-shift subsystem.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   CashSession   │   │ CashWithdrawal  │   │   SaleRecord    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  operator_id    │   │  operator_id    │   │  method         │       │
//! │  │  opened_at      │   │  amount_cents   │   │  total_cents    │       │
//! │  │  opening_cents  │   │  created_at     │   │  sold_at        │       │
//! │  │  state          │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  SessionState   │   │      Role       │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Open           │   │  Manager        │   │  Cash           │       │
//! │  │  Closed(figures)│   │  Cashier        │   │  ExternalCard   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Open vs. Closed
//! A session's state is a real enum, not a nullable close timestamp. The
//! closing figures (close instant, theoretical cash, counted cash,
//! variance) only exist on the `Closed` variant, so a "closed session
//! without a variance" or an "open session with closing cash" cannot be
//! constructed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Operator role, as reported by the user directory.
///
/// A closed set instead of a free-form string: the privileged check is a
/// method on the type, so a typo'd role name is a compile error rather
/// than a silently-unprivileged operator.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Administrator-equivalent. May observe or close any drawer and is
    /// never auto-bound to a shift on login.
    Manager,
    /// Standard operator. Bound to the single-drawer policy.
    Cashier,
}

impl Role {
    /// Whether this role carries the privileged drawer capabilities:
    /// observing without taking the drawer, explicit manual opens, and
    /// trust-the-till quick closes.
    #[inline]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Role::Manager)
    }
}

// =============================================================================
// Operator
// =============================================================================

/// An operator as seen through the user directory collaborator.
///
/// Till does not own users; it only reads this projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub role: Role,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Only `Cash` moves physical money through the drawer, so only cash
/// sales participate in reconciliation. Card sales still show up in the
/// dashboard totals.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    ExternalCard,
}

// =============================================================================
// Sale Record
// =============================================================================

/// A completed sale, as read from the sales module's append-only stream.
///
/// This subsystem never writes sales; it only sums them over time
/// windows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleRecord {
    pub id: String,
    pub tenant_id: String,
    pub method: PaymentMethod,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

impl SaleRecord {
    /// Returns the sale total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Cash Withdrawal
// =============================================================================

/// Cash taken out of the drawer (supplier payout, bank drop, petty cash).
///
/// Immutable once created. Deliberately NOT keyed to a session: a
/// withdrawal made while no shift is open still has to be accounted for,
/// so attribution is purely by time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashWithdrawal {
    pub id: String,
    pub tenant_id: String,
    pub operator_id: String,
    pub amount_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashWithdrawal {
    /// Returns the withdrawn amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Session State
// =============================================================================

/// The figures written when a session closes.
///
/// All four are computed against one frozen close instant and persisted
/// together; they never exist for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClosingFigures {
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
    /// Expected cash at close: opening + cash sales − withdrawals.
    pub theoretical_cents: i64,
    /// Counted (or, for a privileged quick close, assumed) cash at close.
    pub actual_cents: i64,
    /// actual − theoretical.
    pub variance_cents: i64,
}

/// Whether a session is in progress or finished.
///
/// `Open -> Closed` is the whole lifecycle; `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionState {
    /// The drawer is under this session's responsibility right now.
    Open,
    /// The session has been reconciled and is permanent history.
    Closed(ClosingFigures),
}

// =============================================================================
// Cash Session
// =============================================================================

/// One continuous period a cash drawer is under a single operator's
/// responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CashSession {
    pub id: String,
    pub tenant_id: String,
    pub operator_id: String,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    /// Cash on hand at open. Set once at creation, never mutated.
    pub opening_cents: i64,
    /// Set by the stock-audit module's hook; informational only.
    pub stock_control_done: bool,
    pub state: SessionState,
}

impl CashSession {
    /// Whether the session is still open.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self.state, SessionState::Open)
    }

    /// The closing figures, if the session is closed.
    #[inline]
    pub fn closing(&self) -> Option<&ClosingFigures> {
        match &self.state {
            SessionState::Open => None,
            SessionState::Closed(figures) => Some(figures),
        }
    }

    /// Opening cash as Money.
    #[inline]
    pub fn opening(&self) -> Money {
        Money::from_cents(self.opening_cents)
    }

    /// Variance as Money, if closed.
    #[inline]
    pub fn variance(&self) -> Option<Money> {
        self.closing().map(|c| Money::from_cents(c.variance_cents))
    }
}

// =============================================================================
// History Filter
// =============================================================================

/// Filters for the session history listing.
///
/// All filters are optional and conjunctive. `date_to` is inclusive
/// through the end of that day. Results are newest-first, capped at
/// [`crate::HISTORY_PAGE_SIZE`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct HistoryFilter {
    /// Sessions opened on or after this date.
    #[ts(as = "Option<String>")]
    pub date_from: Option<NaiveDate>,
    /// Sessions opened up to and including this date.
    #[ts(as = "Option<String>")]
    pub date_to: Option<NaiveDate>,
    /// Sessions opened by this operator.
    pub operator_id: Option<String>,
    /// Only sessions where counted cash differed from the expectation.
    pub variance_only: bool,
    /// Filter on whether the stock control was performed.
    pub stock_control: Option<bool>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn open_session() -> CashSession {
        CashSession {
            id: "s-1".to_string(),
            tenant_id: crate::DEFAULT_TENANT_ID.to_string(),
            operator_id: "op-1".to_string(),
            opened_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap(),
            opening_cents: 100_000,
            stock_control_done: false,
            state: SessionState::Open,
        }
    }

    #[test]
    fn test_role_privilege() {
        assert!(Role::Manager.is_privileged());
        assert!(!Role::Cashier.is_privileged());
    }

    #[test]
    fn test_open_session_has_no_closing_figures() {
        let session = open_session();
        assert!(session.is_open());
        assert!(session.closing().is_none());
        assert!(session.variance().is_none());
        assert_eq!(session.opening().cents(), 100_000);
    }

    #[test]
    fn test_closed_session_exposes_figures() {
        let mut session = open_session();
        session.state = SessionState::Closed(ClosingFigures {
            closed_at: Utc.with_ymd_and_hms(2026, 3, 1, 17, 0, 0).unwrap(),
            theoretical_cents: 130_000,
            actual_cents: 129_500,
            variance_cents: -500,
        });

        assert!(!session.is_open());
        assert_eq!(session.variance().unwrap().cents(), -500);
        assert_eq!(session.closing().unwrap().theoretical_cents, 130_000);
    }

    #[test]
    fn test_session_state_serializes_with_status_tag() {
        let session = open_session();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["state"]["status"], "open");
        assert!(json["state"].get("varianceCents").is_none());
    }
}
