use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_address, AppState};
use crate::domain::{Address, IssuerId};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterIssuerRequest {
    pub principal: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerDto {
    pub issuer_id: u16,
    pub principal: Address,
}

pub async fn register_issuer(
    State(state): State<AppState>,
    Json(req): Json<RegisterIssuerRequest>,
) -> Result<Json<IssuerDto>, AppError> {
    let principal = parse_address("principal", &req.principal)?;
    let id = state.service.register_issuer(principal.clone()).await?;
    Ok(Json(IssuerDto {
        issuer_id: id.0,
        principal,
    }))
}

pub async fn get_issuer(
    Path(issuer_id): Path<u16>,
    State(state): State<AppState>,
) -> Result<Json<IssuerDto>, AppError> {
    let principal = state
        .service
        .issuer_principal(IssuerId(issuer_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("issuer {}", issuer_id)))?;
    Ok(Json(IssuerDto {
        issuer_id,
        principal,
    }))
}
