//! Safety pool views.

use std::str::FromStr;

use alloy::primitives::Address;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use fxdao_common::error::AppError;
use fxdao_common::types::{SafetyPoolDeposit, SafetyPoolState, SafetyPoolStats};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/safety-pool/state", get(get_state))
        .route("/api/safety-pool/stats", get(get_stats))
        .route("/api/safety-pool/deposits/{depositor}", get(get_deposit))
}

/// GET /api/safety-pool/state
async fn get_state(State(state): State<AppState>) -> Result<Json<SafetyPoolState>, AppError> {
    let pool = state.safety_pool()?;
    Ok(Json(pool.get_core_state().await?))
}

/// GET /api/safety-pool/stats
async fn get_stats(State(state): State<AppState>) -> Result<Json<SafetyPoolStats>, AppError> {
    let pool = state.safety_pool()?;
    Ok(Json(pool.get_core_stats().await?))
}

/// GET /api/safety-pool/deposits/:depositor - One depositor's position.
async fn get_deposit(
    State(state): State<AppState>,
    Path(depositor): Path<String>,
) -> Result<Json<SafetyPoolDeposit>, AppError> {
    let depositor = Address::from_str(&depositor)
        .map_err(|_| AppError::Validation(format!("Invalid depositor address: {}", depositor)))?;

    let pool = state.safety_pool()?;
    Ok(Json(pool.get_deposit(depositor).await?))
}
