//! # HTTP Routes
//!
//! The request/response surface of the drawer engine.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET  /health` | liveness + database ping |
//! | `GET  /dashboard` | today's totals, cash estimate, weekly series |
//! | `POST /withdrawals` | record a cash withdrawal |
//! | `POST /shifts/claim` | login-time open-or-resume |
//! | `POST /shifts/open` | explicit manual open (privileged) |
//! | `POST /shifts/close` | close with a declared count |
//! | `GET  /shifts/status` | does the operator hold an open shift |
//! | `GET  /shifts/stock-control` | stock-control flag of the open shift |
//! | `POST /shifts/stock-control` | audit-module hook |
//! | `GET  /shifts/history` | filtered listing, newest first, one page |

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};
use serde_json::json;

use crate::state::AppState;

pub mod dashboard;
pub mod shifts;
pub mod withdrawals;

/// Builds the full application router with shared state attached.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(dashboard::router())
        .merge(shifts::router())
        .merge(withdrawals::router())
        .layer(Extension(state))
}

/// Liveness probe with a database ping.
async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let database = state.db.health_check().await;
    let status = if database { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "database": database,
    }))
}
