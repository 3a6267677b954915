//! # Shift Routes
//!
//! The drawer lifecycle surface: claim (login-time open-or-resume),
//! manual open, close, status probes, the stock-control hook, and the
//! history browser.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use till_core::{CashSession, HistoryFilter};

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router {
    Router::new()
        .route("/shifts/claim", post(claim_shift))
        .route("/shifts/open", post(open_shift_manual))
        .route("/shifts/close", post(close_shift))
        .route("/shifts/status", get(session_status))
        .route(
            "/shifts/stock-control",
            get(stock_control_status).post(complete_stock_control),
        )
        .route("/shifts/history", get(history))
}

// =============================================================================
// Request / Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorBody {
    pub operator_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseShiftBody {
    pub operator_id: String,
    /// Counted cash. Optional only for privileged operators.
    pub actual_cents: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorQuery {
    pub operator_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub operator_id: Option<String>,
    pub variance_only: Option<bool>,
    pub stock_check: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimShiftResponse {
    /// The operator's shift, or null for a privileged login that
    /// observes without taking the drawer.
    pub session: Option<CashSession>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockControlResponse {
    pub done: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub items: Vec<CashSession>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Login-time automatic path: resume, open, or (for managers) neither.
pub async fn claim_shift(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<OperatorBody>,
) -> Result<Json<ClaimShiftResponse>, ApiError> {
    let session = state.sessions.open_or_resume(&body.operator_id).await?;
    Ok(Json(ClaimShiftResponse { session }))
}

/// Explicit manual open (privileged action).
pub async fn open_shift_manual(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<OperatorBody>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.open_manual(&body.operator_id).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Closes the operator's shift with the declared count.
pub async fn close_shift(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<CloseShiftBody>,
) -> Result<Json<CashSession>, ApiError> {
    let session = state
        .sessions
        .close(&body.operator_id, body.actual_cents)
        .await?;
    Ok(Json(session))
}

/// Whether the operator currently holds an open shift.
pub async fn session_status(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<OperatorQuery>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let active = state.sessions.session_status(&query.operator_id).await?;
    Ok(Json(SessionStatusResponse { active }))
}

/// Whether the operator's open shift has been stock-controlled.
pub async fn stock_control_status(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<OperatorQuery>,
) -> Result<Json<StockControlResponse>, ApiError> {
    let done = state
        .sessions
        .stock_control_status(&query.operator_id)
        .await?;
    Ok(Json(StockControlResponse { done }))
}

/// Inbound hook for the stock-audit module: marks the operator's open
/// shift as counted. A no-op without an open shift.
pub async fn complete_stock_control(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<OperatorBody>,
) -> Result<Json<StockControlResponse>, ApiError> {
    let done = state
        .sessions
        .mark_stock_control_done(&body.operator_id)
        .await?;
    Ok(Json(StockControlResponse { done }))
}

/// Filtered shift history, newest first, one page.
pub async fn history(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let filter = HistoryFilter {
        date_from: query.date_from,
        date_to: query.date_to,
        operator_id: query.operator_id,
        variance_only: query.variance_only.unwrap_or(false),
        stock_control: query.stock_check,
    };

    let items = state.dashboard.history(&filter).await?;
    Ok(Json(HistoryResponse { items }))
}
