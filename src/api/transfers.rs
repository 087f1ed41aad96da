use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::{parse_address, AppState};
use crate::db::TransferRow;
use crate::error::AppError;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersQuery {
    pub sub_account: Option<String>,
    pub after_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransfersResponse {
    pub transfers: Vec<TransferRow>,
    /// Pass back as `afterId` to continue.
    pub last_id: Option<i64>,
}

/// Page through the transfer outbox in commit order.
pub async fn get_transfers(
    Query(params): Query<TransfersQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransfersResponse>, AppError> {
    let sub_account = params
        .sub_account
        .as_deref()
        .map(|s| parse_address("subAccount", s))
        .transpose()?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let transfers = state
        .repo
        .query_transfers(sub_account.as_ref(), params.after_id.unwrap_or(0), limit)
        .await?;
    let last_id = transfers.last().map(|t| t.id);
    Ok(Json(TransfersResponse { transfers, last_id }))
}
