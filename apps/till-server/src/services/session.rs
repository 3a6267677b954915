//! # Session Service
//!
//! The shift lifecycle manager and its concurrency guard.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shift Lifecycle                                  │
//! │                                                                         │
//! │  login ──► open_or_resume ──┬── Resumed ──► same session, unchanged    │
//! │                             ├── Denied ───► 409 naming the holder      │
//! │                             └── Eligible ─┬─ manager ──► no session    │
//! │                                           └─ cashier ──► OPEN          │
//! │                                                                         │
//! │  manager button ──► open_manual ──► OPEN (409 if any shift is open)    │
//! │                                                                         │
//! │  OPEN ──► close ──► CLOSED (terminal)                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Who really enforces "one open shift"
//! `try_acquire` reads then decides — a classic check-then-act. Under
//! concurrent requests two operators can both see "no open shift" and
//! both insert. The read is for good error messages and idempotent
//! resume; the actual guarantee is the partial unique index in till-db,
//! which fails the second insert. This service turns that failure back
//! into the same Conflict the loser would have gotten had the requests
//! arrived in order.

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use till_core::money::Money;
use till_core::reconcile;
use till_core::validation::validate_operator_id;
use till_core::{CashSession, CoreError, Operator, SessionState, DEFAULT_TENANT_ID};
use till_db::Database;

use crate::error::ApiError;
use crate::services::reconcile::Reconciliation;

/// Outcome of asking for the drawer.
#[derive(Debug, Clone)]
pub enum DrawerClaim {
    /// The caller already holds the open shift (idempotent re-login).
    Resumed(CashSession),
    /// Another operator holds it and the caller may not take it.
    Denied { owner: Operator },
    /// No obstacle for this caller. For a privileged caller this can
    /// also mean "someone else's shift is open but you may observe".
    Eligible,
}

/// Shift lifecycle manager.
#[derive(Debug, Clone)]
pub struct SessionService {
    db: Database,
    reconciliation: Reconciliation,
}

impl SessionService {
    pub fn new(db: Database, reconciliation: Reconciliation) -> Self {
        SessionService { db, reconciliation }
    }

    /// Resolves an operator ID through the user directory.
    async fn operator(&self, operator_id: &str) -> Result<Operator, ApiError> {
        validate_operator_id(operator_id).map_err(CoreError::from)?;

        self.db
            .users()
            .get(operator_id)
            .await?
            .ok_or_else(|| CoreError::OperatorNotFound(operator_id.to_string()).into())
    }

    /// The concurrency guard: may this operator have the drawer?
    ///
    /// - Their own shift is open: `Resumed` with it, unchanged.
    /// - Someone else's shift is open: privileged callers are
    ///   `Eligible` to observe (never auto-opening), everyone else is
    ///   `Denied` with the holder named.
    /// - Nothing open: `Eligible`.
    pub async fn try_acquire(&self, operator: &Operator) -> Result<DrawerClaim, ApiError> {
        match self.db.sessions().find_open().await? {
            Some(session) if session.operator_id == operator.id => {
                Ok(DrawerClaim::Resumed(session))
            }
            Some(session) => {
                if operator.role.is_privileged() {
                    return Ok(DrawerClaim::Eligible);
                }
                let owner = self.holder_of(&session).await?;
                Ok(DrawerClaim::Denied { owner })
            }
            None => Ok(DrawerClaim::Eligible),
        }
    }

    /// The automatic login-time path.
    ///
    /// Returns the operator's session — the existing one on resume, a
    /// fresh one for an eligible cashier, and `None` for a privileged
    /// operator, who observes without taking the drawer.
    pub async fn open_or_resume(&self, operator_id: &str) -> Result<Option<CashSession>, ApiError> {
        debug!(operator = %operator_id, "open_or_resume");
        let operator = self.operator(operator_id).await?;

        match self.try_acquire(&operator).await? {
            DrawerClaim::Resumed(session) => {
                debug!(session = %session.id, "Resuming existing shift");
                Ok(Some(session))
            }
            DrawerClaim::Denied { owner } => {
                Err(CoreError::DrawerHeld { owner: owner.name }.into())
            }
            DrawerClaim::Eligible if operator.role.is_privileged() => Ok(None),
            DrawerClaim::Eligible => self.open_session(&operator).await.map(Some),
        }
    }

    /// The explicit manual open, a privileged-only action.
    ///
    /// Unlike the automatic path this one does open a shift for a
    /// manager — but it re-checks global exclusivity first and fails
    /// with Conflict while any shift is open. Re-requesting an open the
    /// caller already holds resumes it.
    pub async fn open_manual(&self, operator_id: &str) -> Result<CashSession, ApiError> {
        debug!(operator = %operator_id, "open_manual");
        let operator = self.operator(operator_id).await?;

        if !operator.role.is_privileged() {
            return Err(ApiError::validation(
                "Manual shift open requires a privileged role",
            ));
        }

        if let Some(session) = self.db.sessions().find_open().await? {
            if session.operator_id == operator.id {
                return Ok(session);
            }
            let owner = self.holder_of(&session).await?;
            return Err(CoreError::DrawerHeld { owner: owner.name }.into());
        }

        self.open_session(&operator).await
    }

    /// Opens a fresh shift for the operator.
    ///
    /// The opening balance folds in whatever cash floated since the
    /// last close. The insert is the commit point: losing the race to
    /// another open surfaces as the same Conflict a sequential request
    /// would have seen.
    async fn open_session(&self, operator: &Operator) -> Result<CashSession, ApiError> {
        let now = Utc::now();
        let opening = self.reconciliation.opening_balance(now).await?;

        let session = CashSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            operator_id: operator.id.clone(),
            opened_at: now,
            opening_cents: opening.cents(),
            stock_control_done: false,
            state: SessionState::Open,
        };

        match self.db.sessions().insert_open(&session).await {
            Ok(()) => {
                info!(
                    session = %session.id,
                    operator = %operator.name,
                    opening = %opening,
                    "Shift opened"
                );
                Ok(session)
            }
            Err(e) if e.is_unique_violation() => Err(self.lost_open_race().await),
            Err(e) => Err(e.into()),
        }
    }

    /// Builds the Conflict for an open attempt that lost the insert
    /// race, naming the winner when it is still visible.
    async fn lost_open_race(&self) -> ApiError {
        match self.db.sessions().find_open().await {
            Ok(Some(session)) => match self.holder_of(&session).await {
                Ok(owner) => CoreError::DrawerHeld { owner: owner.name }.into(),
                Err(e) => e,
            },
            _ => ApiError::conflict("Another shift was opened concurrently"),
        }
    }

    /// Resolves the holder of an open session for error messages.
    async fn holder_of(&self, session: &CashSession) -> Result<Operator, ApiError> {
        self.db
            .users()
            .get(&session.operator_id)
            .await?
            .ok_or_else(|| {
                ApiError::internal(format!(
                    "open session {} references unknown operator {}",
                    session.id, session.operator_id
                ))
            })
    }

    /// Closes the operator's open shift.
    ///
    /// One timestamp is snapped up front and threaded through every
    /// window sum, so the theoretical figure and the stored close
    /// instant can never disagree about which sales were in the shift.
    /// All four closing fields are persisted in a single guarded
    /// UPDATE.
    pub async fn close(
        &self,
        operator_id: &str,
        declared_actual_cents: Option<i64>,
    ) -> Result<CashSession, ApiError> {
        debug!(operator = %operator_id, "close shift");
        let operator = self.operator(operator_id).await?;

        let session = self
            .db
            .sessions()
            .find_open_for_operator(&operator.id)
            .await?
            .ok_or(CoreError::NoOpenSession {
                operator: operator.name.clone(),
            })?;

        // The single clock read for the whole close.
        let close_time = Utc::now();

        let activity = self
            .reconciliation
            .shift_activity(session.opened_at, close_time)
            .await?;

        let closed = reconcile::close_session(
            &session,
            operator.role,
            close_time,
            activity,
            declared_actual_cents.map(Money::from_cents),
        )?;

        let figures = match closed.closing() {
            Some(figures) => *figures,
            None => return Err(ApiError::internal("close_session produced an open session")),
        };

        self.db.sessions().close(&closed.id, &figures).await?;

        info!(
            session = %closed.id,
            operator = %operator.name,
            theoretical = figures.theoretical_cents,
            actual = figures.actual_cents,
            variance = figures.variance_cents,
            "Shift closed"
        );

        Ok(closed)
    }

    /// Inbound hook from the stock-audit module.
    ///
    /// Annotates the operator's open shift; silently a no-op when there
    /// is none. Returns whether a shift was annotated.
    pub async fn mark_stock_control_done(&self, operator_id: &str) -> Result<bool, ApiError> {
        let operator = self.operator(operator_id).await?;

        let marked = self
            .db
            .sessions()
            .set_stock_control_done(&operator.id)
            .await?;

        if marked {
            info!(operator = %operator.name, "Stock control recorded on open shift");
        } else {
            debug!(operator = %operator.name, "Stock control hook with no open shift");
        }

        Ok(marked)
    }

    /// Whether the operator currently has an open shift.
    pub async fn session_status(&self, operator_id: &str) -> Result<bool, ApiError> {
        let operator = self.operator(operator_id).await?;
        Ok(self
            .db
            .sessions()
            .find_open_for_operator(&operator.id)
            .await?
            .is_some())
    }

    /// Whether the operator's open shift has had its stock control
    /// performed. `false` when no shift is open.
    pub async fn stock_control_status(&self, operator_id: &str) -> Result<bool, ApiError> {
        let operator = self.operator(operator_id).await?;
        Ok(self
            .db
            .sessions()
            .find_open_for_operator(&operator.id)
            .await?
            .map(|s| s.stock_control_done)
            .unwrap_or(false))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::testutil::{seed_sale, seed_user, seed_withdrawal, test_db};

    async fn service() -> SessionService {
        let db = test_db().await;
        seed_user(&db, "mgr", "Alice Romero", "manager").await;
        seed_user(&db, "cash-1", "Bob Tanaka", "cashier").await;
        seed_user(&db, "cash-2", "Carol Mwangi", "cashier").await;
        SessionService::new(db.clone(), Reconciliation::new(db))
    }

    #[tokio::test]
    async fn test_cashier_open_creates_session() {
        let svc = service().await;

        let session = svc.open_or_resume("cash-1").await.unwrap().unwrap();
        assert!(session.is_open());
        assert_eq!(session.operator_id, "cash-1");
        // First shift ever: drawer history starts at zero.
        assert_eq!(session.opening_cents, 0);
    }

    #[tokio::test]
    async fn test_open_is_idempotent_for_same_operator() {
        let svc = service().await;

        let first = svc.open_or_resume("cash-1").await.unwrap().unwrap();
        let second = svc.open_or_resume("cash-1").await.unwrap().unwrap();

        // Same session, byte for byte: nothing was mutated by resume.
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_conflicting_open_names_the_holder() {
        let svc = service().await;

        svc.open_or_resume("cash-1").await.unwrap();
        let err = svc.open_or_resume("cash-2").await.unwrap_err();

        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("Bob Tanaka"), "got: {}", err.message);
    }

    #[tokio::test]
    async fn test_privileged_login_never_auto_opens() {
        let svc = service().await;

        // No shift open: manager logs in, still no shift.
        assert!(svc.open_or_resume("mgr").await.unwrap().is_none());
        assert!(!svc.session_status("mgr").await.unwrap());

        // Someone else's shift open: manager may observe, not take.
        svc.open_or_resume("cash-1").await.unwrap();
        assert!(svc.open_or_resume("mgr").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_manual_open_is_privileged_and_exclusive() {
        let svc = service().await;

        // Cashiers don't get the manual path.
        let err = svc.open_manual("cash-1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Manager opens explicitly.
        let session = svc.open_manual("mgr").await.unwrap();
        assert_eq!(session.operator_id, "mgr");

        // Re-requesting their own open resumes it.
        let again = svc.open_manual("mgr").await.unwrap();
        assert_eq!(again.id, session.id);

        // With a cashier shift open instead, the manual path conflicts
        // — unlike the automatic path, it is not silently skipped.
        svc.close("mgr", Some(0)).await.unwrap();
        svc.open_or_resume("cash-1").await.unwrap();
        let err = svc.open_manual("mgr").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.message.contains("Bob Tanaka"));
    }

    #[tokio::test]
    async fn test_close_computes_reconciliation() {
        let svc = service().await;

        let session = svc.open_or_resume("cash-1").await.unwrap().unwrap();

        // Activity inside the shift window.
        seed_sale(&svc.db, "cash", 50_000, Utc::now()).await;
        seed_sale(&svc.db, "external_card", 9_999, Utc::now()).await;
        seed_withdrawal(&svc.db, "cash-1", 20_000, Utc::now()).await;

        let closed = svc.close("cash-1", Some(29_500)).await.unwrap();
        let figures = *closed.closing().unwrap();

        // opening 0 + cash 500.00 − withdrawn 200.00 = 300.00
        assert_eq!(figures.theoretical_cents, 30_000);
        assert_eq!(figures.actual_cents, 29_500);
        assert_eq!(figures.variance_cents, -500);
        assert_eq!(closed.id, session.id);

        // The close stuck.
        assert!(!svc.session_status("cash-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cashier_close_requires_declared_count() {
        let svc = service().await;

        svc.open_or_resume("cash-1").await.unwrap();
        let err = svc.close("cash-1", None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        // Nothing was mutated: the shift is still open and closable.
        assert!(svc.session_status("cash-1").await.unwrap());
        svc.close("cash-1", Some(0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_privileged_quick_close_trusts_the_till() {
        let svc = service().await;

        svc.open_manual("mgr").await.unwrap();
        seed_sale(&svc.db, "cash", 12_345, Utc::now()).await;

        let closed = svc.close("mgr", None).await.unwrap();
        let figures = closed.closing().unwrap();
        assert_eq!(figures.actual_cents, figures.theoretical_cents);
        assert_eq!(figures.variance_cents, 0);
    }

    #[tokio::test]
    async fn test_close_without_open_shift_is_not_found() {
        let svc = service().await;

        let err = svc.close("cash-1", Some(0)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_unknown_operator_is_not_found() {
        let svc = service().await;

        let err = svc.open_or_resume("ghost").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_opening_balance_carries_across_shifts() {
        let svc = service().await;

        // Shift 1: counted 300.00 on close.
        svc.open_or_resume("cash-1").await.unwrap();
        seed_sale(&svc.db, "cash", 30_000, Utc::now()).await;
        svc.close("cash-1", Some(30_000)).await.unwrap();

        // Between shifts: cash keeps moving with nobody on the drawer.
        seed_sale(&svc.db, "cash", 5_000, Utc::now()).await;
        seed_withdrawal(&svc.db, "cash-1", 2_000, Utc::now()).await;

        // Shift 2 opens with the counted cash plus the floating net.
        let session = svc.open_or_resume("cash-2").await.unwrap().unwrap();
        assert_eq!(session.opening_cents, 33_000);
    }

    #[tokio::test]
    async fn test_stock_control_hook() {
        let svc = service().await;

        // No open shift: silent no-op.
        assert!(!svc.mark_stock_control_done("cash-1").await.unwrap());
        assert!(!svc.stock_control_status("cash-1").await.unwrap());

        svc.open_or_resume("cash-1").await.unwrap();
        assert!(svc.mark_stock_control_done("cash-1").await.unwrap());
        assert!(svc.stock_control_status("cash-1").await.unwrap());
    }
}
