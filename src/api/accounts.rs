use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_address, parse_amount, parse_token_id, AppState};
use crate::domain::{Address, AssetId};
use crate::engine::FullMarginAccount;
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub sub_account: Address,
    pub short_call_id: String,
    pub short_call_amount: String,
    pub short_put_id: String,
    pub short_put_amount: String,
    pub collateral_id: u8,
    pub collateral_amount: String,
    pub is_empty: bool,
}

impl AccountDto {
    fn new(sub_account: Address, account: &FullMarginAccount) -> Self {
        Self {
            sub_account,
            short_call_id: account.short_call_id.to_hex(),
            short_call_amount: account.short_call_amount.to_string(),
            short_put_id: account.short_put_id.to_hex(),
            short_put_amount: account.short_put_amount.to_string(),
            collateral_id: account.collateral_id.0,
            collateral_amount: account.collateral_amount.to_string(),
            is_empty: account.is_empty(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub asset_id: u8,
    pub amount: String,
    pub from: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub asset_id: u8,
    pub amount: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionAmountRequest {
    pub token_id: String,
    pub amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub short_id: String,
    pub long_id: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResponse {
    pub spread_id: String,
    pub long_id: String,
    pub burn_amount: String,
    pub account: AccountDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
    pub spread_id: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitResponse {
    pub short_id: String,
    pub long_id: String,
    pub mint_amount: String,
    pub account: AccountDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettleRequest {
    /// Signed; positive leaves the account.
    pub payout: String,
}

pub async fn get_account(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let account = state.service.account(&owner).await?;
    Ok(Json(AccountDto::new(owner, &account)))
}

pub async fn add_collateral(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let from = parse_address("from", &req.from)?;
    let amount = parse_amount::<u128>("amount", &req.amount)?;
    let account = state
        .service
        .add_collateral(&owner, &from, AssetId(req.asset_id), amount)
        .await?;
    Ok(Json(AccountDto::new(owner, &account)))
}

pub async fn remove_collateral(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let to = parse_address("to", &req.to)?;
    let amount = parse_amount::<u128>("amount", &req.amount)?;
    let account = state
        .service
        .remove_collateral(&owner, &to, AssetId(req.asset_id), amount)
        .await?;
    Ok(Json(AccountDto::new(owner, &account)))
}

pub async fn mint(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<OptionAmountRequest>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let token_id = parse_token_id("tokenId", &req.token_id)?;
    let amount = parse_amount::<u64>("amount", &req.amount)?;
    let account = state.service.mint_option(&owner, token_id, amount).await?;
    Ok(Json(AccountDto::new(owner, &account)))
}

pub async fn burn(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<OptionAmountRequest>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let token_id = parse_token_id("tokenId", &req.token_id)?;
    let amount = parse_amount::<u64>("amount", &req.amount)?;
    let account = state.service.burn_option(&owner, token_id, amount).await?;
    Ok(Json(AccountDto::new(owner, &account)))
}

pub async fn merge(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let short_id = parse_token_id("shortId", &req.short_id)?;
    let long_id = parse_token_id("longId", &req.long_id)?;
    let amount = parse_amount::<u64>("amount", &req.amount)?;
    let (outcome, account) = state
        .service
        .merge(&owner, short_id, long_id, amount)
        .await?;
    Ok(Json(MergeResponse {
        spread_id: outcome.spread_id.to_hex(),
        long_id: outcome.long_id.to_hex(),
        burn_amount: outcome.burn_amount.to_string(),
        account: AccountDto::new(owner, &account),
    }))
}

pub async fn split(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SplitRequest>,
) -> Result<Json<SplitResponse>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let spread_id = parse_token_id("spreadId", &req.spread_id)?;
    let amount = parse_amount::<u64>("amount", &req.amount)?;
    let (outcome, account) = state.service.split(&owner, spread_id, amount).await?;
    Ok(Json(SplitResponse {
        short_id: outcome.short_id.to_hex(),
        long_id: outcome.long_id.to_hex(),
        mint_amount: outcome.mint_amount.to_string(),
        account: AccountDto::new(owner, &account),
    }))
}

pub async fn settle(
    Path(sub_account): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<SettleRequest>,
) -> Result<Json<AccountDto>, AppError> {
    let owner = parse_address("sub account", &sub_account)?;
    let payout = parse_amount::<i128>("payout", &req.payout)?;
    let account = state.service.settle_at_expiry(&owner, payout).await?;
    Ok(Json(AccountDto::new(owner, &account)))
}
