pub mod accounts;
pub mod health;
pub mod issuers;
pub mod settlements;
pub mod tokens;
pub mod transfers;

use crate::config::Config;
use crate::db::Repository;
use crate::domain::{Address, TokenId};
use crate::error::AppError;
use crate::orchestration::MarginService;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub service: Arc<MarginService>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config, service: Arc<MarginService>) -> Self {
        Self {
            repo,
            config,
            service,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/accounts/:sub_account", get(accounts::get_account))
        .route(
            "/v1/accounts/:sub_account/collateral/add",
            post(accounts::add_collateral),
        )
        .route(
            "/v1/accounts/:sub_account/collateral/remove",
            post(accounts::remove_collateral),
        )
        .route("/v1/accounts/:sub_account/mint", post(accounts::mint))
        .route("/v1/accounts/:sub_account/burn", post(accounts::burn))
        .route("/v1/accounts/:sub_account/merge", post(accounts::merge))
        .route("/v1/accounts/:sub_account/split", post(accounts::split))
        .route("/v1/accounts/:sub_account/settle", post(accounts::settle))
        .route("/v1/issuers", post(issuers::register_issuer))
        .route("/v1/issuers/:issuer_id", get(issuers::get_issuer))
        .route("/v1/settlements/terms", get(settlements::get_terms))
        .route("/v1/settlements/terms/batch", post(settlements::get_terms_batch))
        .route("/v1/settlements/physical", post(settlements::settle_physical))
        .route("/v1/tokens/encode", post(tokens::encode))
        .route("/v1/tokens/decode", get(tokens::decode))
        .route("/v1/transfers", get(transfers::get_transfers))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_address(field: &str, raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {}", field)))
}

pub(crate) fn parse_token_id(field: &str, raw: &str) -> Result<TokenId, AppError> {
    TokenId::from_str(raw).map_err(|e| AppError::BadRequest(format!("Invalid {}: {}", field, e)))
}

/// Amounts travel as decimal strings; u128 does not survive JSON numbers.
pub(crate) fn parse_amount<T: FromStr>(field: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AppError::BadRequest(format!("Invalid {}", field)))
}
