//! # Reconciliation Calculator
//!
//! The pure arithmetic behind every drawer reconciliation.
//!
//! ## The Two Windows
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reconciliation Windows                               │
//! │                                                                         │
//! │        session N                    gap                session N+1      │
//! │  ├───────────────────┤    ├──────────────────────┤   ├──────────────   │
//! │  open                close                        open                  │
//! │                                                                         │
//! │  THEORETICAL CLOSING of N:   [opened_at, close_time]   inclusive/incl. │
//! │  FLOATING BALANCE of gap:    (closed_at, now]          excl./inclusive │
//! │                                                                         │
//! │  A sale stamped exactly at N's close instant belongs to N and must     │
//! │  NOT be counted again in the gap — hence the exclusive left bound.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gap matters because cash can move while no shift is open (a
//! manager ringing up sales without taking the drawer). That "limbo"
//! cash is folded into the next shift's opening balance so the money is
//! never lost from the books.
//!
//! Everything here is pure: callers fetch the window sums from storage
//! and pass them in, along with one frozen timestamp per computation.

use chrono::{DateTime, Utc};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CashSession, ClosingFigures, Role, SessionState};

// =============================================================================
// Shift Activity
// =============================================================================

/// The drawer-relevant movement inside one time window: cash-method
/// sales in, withdrawals out. Card sales never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShiftActivity {
    pub cash_sales: Money,
    pub withdrawals: Money,
}

impl ShiftActivity {
    pub fn new(cash_sales: Money, withdrawals: Money) -> Self {
        ShiftActivity {
            cash_sales,
            withdrawals,
        }
    }

    /// Net cash movement: sales in minus withdrawals out.
    #[inline]
    pub fn net(&self) -> Money {
        self.cash_sales - self.withdrawals
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Expected cash at close: opening + cash sales − withdrawals over the
/// session window.
#[inline]
pub fn theoretical_closing(opening: Money, activity: ShiftActivity) -> Money {
    opening + activity.net()
}

/// Opening balance for a new shift: the last shift's counted closing
/// cash plus whatever moved in the gap since. With no prior closed
/// shift the drawer history starts at zero.
#[inline]
pub fn opening_balance(last_actual_closing: Money, floating: ShiftActivity) -> Money {
    last_actual_closing + floating.net()
}

/// Discrepancy between counted and expected cash.
#[inline]
pub fn variance(actual: Money, theoretical: Money) -> Money {
    actual - theoretical
}

/// Computes the full set of closing figures for a session.
///
/// The rules, in order:
/// 1. theoretical = opening + window activity;
/// 2. actual = the declared count if given; otherwise a privileged
///    operator gets a trust-the-till quick close (actual = theoretical,
///    variance 0), and a standard operator gets a validation error —
///    counting the drawer is not optional for a cashier;
/// 3. variance = actual − theoretical.
///
/// Pure: returns the closed session value, persistence is the caller's
/// job. `close_time` must be captured once and reused for the window
/// sums in `activity`, so a sale cannot land between two clock reads.
pub fn close_session(
    session: &CashSession,
    role: Role,
    close_time: DateTime<Utc>,
    activity: ShiftActivity,
    declared_actual: Option<Money>,
) -> CoreResult<CashSession> {
    if !session.is_open() {
        return Err(crate::CoreError::NoOpenSession {
            operator: session.operator_id.clone(),
        });
    }

    let theoretical = theoretical_closing(session.opening(), activity);

    let actual = match declared_actual {
        Some(amount) => amount,
        None if role.is_privileged() => theoretical,
        None => {
            return Err(ValidationError::Required {
                field: "actual_cents".to_string(),
            }
            .into())
        }
    };

    let mut closed = session.clone();
    closed.state = SessionState::Closed(ClosingFigures {
        closed_at: close_time,
        theoretical_cents: theoretical.cents(),
        actual_cents: actual.cents(),
        variance_cents: variance(actual, theoretical).cents(),
    });

    Ok(closed)
}

// =============================================================================
// Unit Tests
// =============================================================================
