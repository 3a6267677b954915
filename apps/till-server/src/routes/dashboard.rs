//! # Dashboard Route

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Json, Router};

use crate::error::ApiError;
use crate::services::dashboard::TodaySummary;
use crate::state::AppState;

pub fn router() -> Router {
    Router::new().route("/dashboard", get(dashboard))
}

/// Today's totals by payment method, the current cash estimate, and
/// the trailing week of sales.
pub async fn dashboard(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<TodaySummary>, ApiError> {
    let summary = state.dashboard.todays_summary().await?;
    Ok(Json(summary))
}
