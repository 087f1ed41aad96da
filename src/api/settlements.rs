use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_address, parse_amount, parse_token_id, AppState};
use crate::domain::{AssetId, Settlement};
use crate::engine::SettlementReceipt;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsQuery {
    pub token_id: String,
    /// Unix seconds; defaults to now.
    pub at: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermsBatchRequest {
    pub token_ids: Vec<String>,
    pub at: Option<u64>,
}

/// Wire form of a settlement. Amounts are decimal strings.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementDto {
    pub token_id: String,
    #[serde(default)]
    pub token_amount: String,
    pub debt_asset_id: u8,
    pub debt_per_token: String,
    pub payout_asset_id: u8,
    pub payout_per_token: String,
    #[serde(default)]
    pub debtor: String,
    #[serde(default)]
    pub creditor: String,
}

impl From<&Settlement> for SettlementDto {
    fn from(s: &Settlement) -> Self {
        Self {
            token_id: s.token_id.to_hex(),
            token_amount: s.token_amount.to_string(),
            debt_asset_id: s.debt_asset_id.0,
            debt_per_token: s.debt_per_token.to_string(),
            payout_asset_id: s.payout_asset_id.0,
            payout_per_token: s.payout_per_token.to_string(),
            debtor: s.debtor.to_string(),
            creditor: s.creditor.to_string(),
        }
    }
}

impl SettlementDto {
    fn into_settlement(self) -> Result<Settlement, AppError> {
        Ok(Settlement {
            token_id: parse_token_id("tokenId", &self.token_id)?,
            token_amount: parse_amount("tokenAmount", &self.token_amount)?,
            debt_asset_id: AssetId(self.debt_asset_id),
            debt_per_token: parse_amount("debtPerToken", &self.debt_per_token)?,
            payout_asset_id: AssetId(self.payout_asset_id),
            payout_per_token: parse_amount("payoutPerToken", &self.payout_per_token)?,
            debtor: parse_address("debtor", &self.debtor)?,
            creditor: parse_address("creditor", &self.creditor)?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlePhysicalRequest {
    pub caller: String,
    pub settlement: SettlementDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementReceiptDto {
    pub issuer: String,
    pub debt: String,
    pub payout: String,
    pub debt_to_account: bool,
}

impl From<SettlementReceipt> for SettlementReceiptDto {
    fn from(r: SettlementReceipt) -> Self {
        Self {
            issuer: r.issuer.to_string(),
            debt: r.debt.to_string(),
            payout: r.payout.to_string(),
            debt_to_account: r.debt_to_account,
        }
    }
}

pub async fn get_terms(
    Query(params): Query<TermsQuery>,
    State(state): State<AppState>,
) -> Result<Json<SettlementDto>, AppError> {
    let token_id = parse_token_id("tokenId", &params.token_id)?;
    let terms = state.service.settlement_terms(token_id, params.at).await?;
    Ok(Json(SettlementDto::from(&terms)))
}

pub async fn get_terms_batch(
    State(state): State<AppState>,
    Json(req): Json<TermsBatchRequest>,
) -> Result<Json<Vec<SettlementDto>>, AppError> {
    let token_ids = req
        .token_ids
        .iter()
        .map(|raw| parse_token_id("tokenIds", raw))
        .collect::<Result<Vec<_>, _>>()?;
    let terms = state
        .service
        .settlement_terms_batch(&token_ids, req.at)
        .await?;
    Ok(Json(terms.iter().map(SettlementDto::from).collect()))
}

pub async fn settle_physical(
    State(state): State<AppState>,
    Json(req): Json<SettlePhysicalRequest>,
) -> Result<Json<SettlementReceiptDto>, AppError> {
    let caller = parse_address("caller", &req.caller)?;
    let settlement = req.settlement.into_settlement()?;
    let receipt = state.service.settle_physical(&caller, &settlement).await?;
    Ok(Json(receipt.into()))
}
