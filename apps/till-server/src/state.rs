//! Shared application state.
//!
//! One `AppState` is built at startup and handed to every handler via
//! an axum `Extension`. Services hold cheap clones of the database
//! handle (the pool is reference-counted).

use till_db::Database;

use crate::services::dashboard::DashboardService;
use crate::services::reconcile::Reconciliation;
use crate::services::session::SessionService;
use crate::services::withdrawal::WithdrawalService;

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionService,
    pub withdrawals: WithdrawalService,
    pub dashboard: DashboardService,
}

impl AppState {
    /// Wires the service layer over one database handle.
    pub fn new(db: Database) -> Self {
        let reconciliation = Reconciliation::new(db.clone());

        AppState {
            sessions: SessionService::new(db.clone(), reconciliation.clone()),
            withdrawals: WithdrawalService::new(db.clone()),
            dashboard: DashboardService::new(db.clone(), reconciliation),
            db,
        }
    }
}
