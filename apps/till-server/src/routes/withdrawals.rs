//! # Withdrawal Routes

use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

pub fn router() -> Router {
    Router::new().route("/withdrawals", post(create_withdrawal))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalBody {
    pub operator_id: String,
    pub amount_cents: i64,
}

/// Records cash taken out of the drawer.
pub async fn create_withdrawal(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<WithdrawalBody>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = state
        .withdrawals
        .record(&body.operator_id, body.amount_cents)
        .await?;

    Ok((StatusCode::CREATED, Json(withdrawal)))
}
