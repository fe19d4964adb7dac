//! Vault list routes.
//!
//! Read-only views of the remote list plus predecessor lookups, liquidation
//! candidates and transaction plans. Nothing is cached; each request reads the
//! list again.

use std::str::FromStr;

use alloy::primitives::{Address, U256};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use fxdao_common::error::AppError;
use fxdao_common::types::{Denomination, Vault, VaultKey, VaultsInfo};
use fxdao_engine::locator::{DEFAULT_PAGE_SIZE, LocateRequest};
use fxdao_engine::planner::{NewVaultPlan, UpdateVaultPlan, VaultOperation};

use crate::state::AppState;

/// Largest page the listing endpoint returns.
pub const MAX_PAGE_LIMIT: u32 = 100;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vaults/deposit-ratio", post(deposit_ratio))
        .route("/api/vaults/{denomination}", get(list_vaults))
        .route("/api/vaults/{denomination}/liquidatable", get(list_liquidatable))
        .route("/api/vaults/{denomination}/info", get(get_info))
        .route("/api/vaults/{denomination}/accounts/{account}", get(get_vault))
        .route("/api/vaults/{denomination}/prev-key", post(find_prev_key))
        .route("/api/vaults/{denomination}/plans/new", post(plan_new_vault))
        .route("/api/vaults/{denomination}/plans/update", post(plan_update))
}

fn parse_denomination(raw: &str) -> Result<Denomination, AppError> {
    Denomination::from_str(raw).map_err(AppError::Validation)
}

fn parse_account(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw)
        .map_err(|_| AppError::Validation(format!("Invalid account address: {}", raw)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub after_account: Option<Address>,
    pub after_index: Option<U256>,
    pub limit: Option<u32>,
}

impl PageQuery {
    fn after_key(&self, denomination: Denomination) -> Result<Option<VaultKey>, AppError> {
        match (self.after_account, self.after_index) {
            (Some(account), Some(index)) => Ok(Some(VaultKey {
                account,
                denomination,
                index,
            })),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "after_account and after_index must be given together".to_string(),
            )),
        }
    }

    fn limit(&self) -> Result<u32, AppError> {
        match self.limit {
            Some(0) => Err(AppError::Validation(
                "limit must be at least 1".to_string(),
            )),
            Some(limit) => Ok(limit.min(MAX_PAGE_LIMIT)),
            None => Ok(DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PrevKeyBody {
    pub account: Address,
    pub target_index: U256,
    pub exclude_self: bool,
}

#[derive(Debug, Serialize)]
pub struct PrevKeyResponse {
    pub prev_key: Option<VaultKey>,
}

#[derive(Debug, Deserialize)]
pub struct DepositRatioBody {
    pub rate: U256,
    pub collateral: U256,
    pub debt: U256,
}

#[derive(Debug, Serialize)]
pub struct DepositRatioResponse {
    pub ratio: U256,
}

#[derive(Debug, Deserialize)]
pub struct NewVaultBody {
    pub account: Address,
    pub collateral: U256,
    pub debt: U256,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVaultBody {
    pub account: Address,
    pub operation: VaultOperation,
}

/// GET /api/vaults/:denomination/info - List metadata, including the lowest key.
async fn get_info(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
) -> Result<Json<VaultsInfo>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let info = state.reader.get_head(denomination).await?;
    Ok(Json(info))
}

/// GET /api/vaults/:denomination/accounts/:account - A single vault.
async fn get_vault(
    State(state): State<AppState>,
    Path((denomination, account)): Path<(String, String)>,
) -> Result<Json<Vault>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let account = parse_account(&account)?;
    let vault = state.reader.get_node(account, denomination).await?;
    Ok(Json(vault))
}

/// GET /api/vaults/:denomination - One page of the list, in list order.
async fn list_vaults(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Vault>>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let after_key = query.after_key(denomination)?;
    let limit = query.limit()?;

    let vaults = state
        .reader
        .get_page(after_key.as_ref(), denomination, limit)
        .await?;
    Ok(Json(vaults))
}

/// GET /api/vaults/:denomination/liquidatable - Vaults below the minimum
/// collateral rate, lowest first.
async fn list_liquidatable(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Vault>>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let after_key = query.after_key(denomination)?;
    let limit = query.limit()?;

    let vaults = state
        .reader
        .get_vaults(after_key.as_ref(), denomination, limit, true)
        .await?;

    tracing::debug!(
        denomination = %denomination,
        candidates = vaults.len(),
        "Listed liquidation candidates"
    );
    Ok(Json(vaults))
}

/// POST /api/vaults/deposit-ratio
async fn deposit_ratio(
    State(state): State<AppState>,
    Json(body): Json<DepositRatioBody>,
) -> Result<Json<DepositRatioResponse>, AppError> {
    if body.debt.is_zero() {
        return Err(AppError::Validation("debt must be greater than zero".to_string()));
    }

    let ratio = state
        .reader
        .calculate_deposit_ratio(body.rate, body.collateral, body.debt)
        .await?;
    Ok(Json(DepositRatioResponse { ratio }))
}

/// POST /api/vaults/:denomination/prev-key - Predecessor for a target index.
async fn find_prev_key(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
    Json(body): Json<PrevKeyBody>,
) -> Result<Json<PrevKeyResponse>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let request = LocateRequest {
        target: body.target_index,
        account: body.account,
        denomination,
        exclude_self: body.exclude_self,
    };

    let prev_key = state
        .planner
        .locator()
        .locate(state.reader.as_ref(), &request)
        .await?;
    Ok(Json(PrevKeyResponse { prev_key }))
}

/// POST /api/vaults/:denomination/plans/new - Arguments for opening a vault.
async fn plan_new_vault(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
    Json(body): Json<NewVaultBody>,
) -> Result<Json<NewVaultPlan>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let plan = state
        .planner
        .plan_new_vault(
            state.reader.as_ref(),
            body.account,
            denomination,
            body.collateral,
            body.debt,
        )
        .await?;
    Ok(Json(plan))
}

/// POST /api/vaults/:denomination/plans/update - Arguments for changing a vault.
async fn plan_update(
    State(state): State<AppState>,
    Path(denomination): Path<String>,
    Json(body): Json<UpdateVaultBody>,
) -> Result<Json<UpdateVaultPlan>, AppError> {
    let denomination = parse_denomination(&denomination)?;
    let plan = state
        .planner
        .plan_update(
            state.reader.as_ref(),
            body.account,
            denomination,
            body.operation,
        )
        .await?;
    Ok(Json(plan))
}
