use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_token_id, AppState};
use crate::domain::{
    AssetId, OptionType, ProductDescriptor, SettlementType, TokenDescriptor, TokenId,
};
use crate::engine::EngineError;
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    /// Defaults to this service's engine id.
    pub engine_id: Option<u8>,
    pub oracle_id: u8,
    pub underlying_id: u8,
    pub strike_id: u8,
    pub collateral_id: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest {
    pub settlement_type: SettlementType,
    pub option_type: OptionType,
    pub product: ProductDto,
    pub expiry: u64,
    pub long_strike: u64,
    /// Cash spreads only.
    #[serde(default)]
    pub short_strike: u64,
    /// Physical tokens only.
    pub issuer_id: Option<u16>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeResponse {
    pub token_id: String,
    pub product_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeQuery {
    pub token_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResponse {
    pub token_id: String,
    pub settlement_type: SettlementType,
    pub option_type: OptionType,
    pub product_id: u64,
    pub product: ProductDto,
    pub expiry: u64,
    pub long_strike: u64,
    pub short_strike: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_id: Option<u16>,
}

/// Pack token terms into an id. Structurally illegal strikes are rejected.
pub async fn encode(
    State(state): State<AppState>,
    Json(req): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, AppError> {
    let product = ProductDescriptor::new(
        req.product.engine_id.unwrap_or(state.config.engine_id),
        req.product.oracle_id,
        AssetId(req.product.underlying_id),
        AssetId(req.product.strike_id),
        AssetId(req.product.collateral_id),
    )
    .encode();

    let short_strike = match (req.settlement_type, req.issuer_id) {
        (SettlementType::Physical, Some(id)) => u64::from(id),
        (SettlementType::Physical, None) => {
            return Err(AppError::BadRequest(
                "issuerId is required for physical tokens".into(),
            ))
        }
        (SettlementType::Cash, Some(_)) => {
            return Err(AppError::BadRequest(
                "issuerId only applies to physical tokens".into(),
            ))
        }
        (SettlementType::Cash, None) => req.short_strike,
    };

    let desc = TokenDescriptor {
        settlement_type: req.settlement_type,
        option_type: req.option_type,
        product_id: product,
        expiry: req.expiry,
        long_strike: req.long_strike,
        short_strike,
    };
    desc.check_strikes().map_err(EngineError::from)?;

    Ok(Json(EncodeResponse {
        token_id: desc.encode().to_hex(),
        product_id: product.as_u64(),
    }))
}

pub async fn decode(Query(params): Query<DecodeQuery>) -> Result<Json<DecodeResponse>, AppError> {
    let token_id = parse_token_id("tokenId", &params.token_id)?;
    let desc = token_id.decode().map_err(EngineError::from)?;
    Ok(Json(describe(token_id, &desc)))
}

fn describe(token_id: TokenId, desc: &TokenDescriptor) -> DecodeResponse {
    let product_id = desc.product_id;
    let product = product_id.decode();
    let issuer_id = match desc.settlement_type {
        SettlementType::Physical => Some(token_id.issuer_id().0),
        SettlementType::Cash => None,
    };
    DecodeResponse {
        token_id: token_id.to_hex(),
        settlement_type: desc.settlement_type,
        option_type: desc.option_type,
        product_id: product_id.as_u64(),
        product: ProductDto {
            engine_id: Some(product.engine_id),
            oracle_id: product.oracle_id,
            underlying_id: product.underlying_id.0,
            strike_id: product.strike_id.0,
            collateral_id: product.collateral_id.0,
        },
        expiry: desc.expiry,
        long_strike: desc.long_strike,
        short_strike: desc.short_strike,
        issuer_id,
    }
}
