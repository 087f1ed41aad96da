use axum::http::StatusCode;
use marginbook::api;
use marginbook::config::{AssetConfig, Config};
use marginbook::db::init_db;
use marginbook::domain::{Address, AssetId, OptionType, ProductDescriptor, SettlementType, TokenId};
use marginbook::{MarginService, Repository};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

const EXPIRY: u64 = 1_767_225_600;
const ONE_WETH: u128 = 1_000_000_000_000_000_000;

struct TestApp {
    app: axum::Router,
    repo: Arc<Repository>,
    _temp: TempDir,
}

fn test_config(db_path: String) -> Config {
    Config {
        port: 0,
        database_path: db_path,
        settlement_driver: Address::new("0xdriver"),
        engine_address: Address::new("marginbook"),
        engine_id: 1,
        settlement_window_secs: 3600,
        assets: vec![
            AssetConfig {
                id: AssetId(1),
                address: Address::new("0xweth"),
                decimals: 18,
            },
            AssetConfig {
                id: AssetId(2),
                address: Address::new("0xusdc"),
                decimals: 6,
            },
        ],
    }
}

async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));
    let config = test_config(db_path);
    let service = Arc::new(MarginService::load(repo.clone(), &config).await.unwrap());
    let app = api::create_router(api::AppState::new(repo.clone(), config, service));

    TestApp {
        app,
        repo,
        _temp: temp_dir,
    }
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    send(app, req).await
}

async fn post(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn send(app: &axum::Router, req: axum::http::Request<axum::body::Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, value)
}

fn cash_call(strike: u64) -> TokenId {
    let product = ProductDescriptor::new(1, 1, AssetId(1), AssetId(2), AssetId(1)).encode();
    TokenId::encode(SettlementType::Cash, OptionType::Call, product, EXPIRY, strike, 0)
}

#[tokio::test]
async fn test_health_and_ready() {
    let t = setup_test_app().await;
    let (status, body) = get(&t.app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = get(&t.app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["assets"], 2);
}

#[tokio::test]
async fn test_unknown_account_reads_empty() {
    let t = setup_test_app().await;
    let (status, body) = get(&t.app, "/v1/accounts/0xalice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEmpty"], true);
    assert_eq!(body["collateralId"], 0);
    assert_eq!(body["collateralAmount"], "0");
}

#[tokio::test]
async fn test_collateral_round_trip_records_transfers() {
    let t = setup_test_app().await;
    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/collateral/add",
        json!({"assetId": 2, "amount": "5000000000", "from": "0xalice"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collateralId"], 2);
    assert_eq!(body["collateralAmount"], "5000000000");

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/collateral/add",
        json!({"assetId": 1, "amount": "1", "from": "0xalice"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "wrong collateral id");

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/collateral/remove",
        json!({"assetId": 2, "amount": "5000000000", "to": "0xbob"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isEmpty"], true);
    assert_eq!(body["collateralId"], 0);

    let transfers = t
        .repo
        .query_transfers(Some(&Address::new("0xalice")), 0, 10)
        .await
        .unwrap();
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].operation, "add_collateral");
    assert_eq!(transfers[0].from, Address::new("0xalice"));
    assert_eq!(transfers[0].to, Address::new("marginbook"));
    assert_eq!(transfers[1].operation, "remove_collateral");
    assert_eq!(transfers[1].to, Address::new("0xbob"));
    assert_eq!(transfers[1].asset, Address::new("0xusdc"));

    let (status, body) = get(&t.app, "/v1/transfers?subAccount=0xalice&afterId=0&limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transfers"].as_array().unwrap().len(), 1);
    assert_eq!(body["lastId"], transfers[0].id);
}

#[tokio::test]
async fn test_unknown_asset_is_not_found() {
    let t = setup_test_app().await;
    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xalice/collateral/add",
        json!({"assetId": 9, "amount": "1", "from": "0xalice"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mint_merge_split_burn_flow() {
    let t = setup_test_app().await;
    let short = cash_call(2_000_000_000);
    let long = cash_call(2_500_000_000);

    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xalice/collateral/add",
        json!({"assetId": 1, "amount": ONE_WETH.to_string(), "from": "0xalice"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/mint",
        json!({"tokenId": short.to_hex(), "amount": "1000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shortCallId"], short.to_hex());
    assert_eq!(body["shortCallAmount"], "1000000");

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/merge",
        json!({"shortId": short.to_hex(), "longId": long.to_hex(), "amount": "1000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["burnAmount"], "1000000");
    assert_eq!(body["longId"], long.to_hex());
    let spread_id = body["spreadId"].as_str().unwrap().to_string();
    assert_eq!(body["account"]["shortCallId"], spread_id);

    let (status, body) = get(&t.app, &format!("/v1/tokens/decode?tokenId={}", spread_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["optionType"], "callSpread");
    assert_eq!(body["longStrike"], 2_000_000_000u64);
    assert_eq!(body["shortStrike"], 2_500_000_000u64);

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/split",
        json!({"spreadId": spread_id, "amount": "1000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shortId"], short.to_hex());
    assert_eq!(body["longId"], long.to_hex());
    assert_eq!(body["mintAmount"], "1000000");

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/burn",
        json!({"tokenId": short.to_hex(), "amount": "1000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shortCallAmount"], "0");
    assert_eq!(body["collateralAmount"], ONE_WETH.to_string());
}

#[tokio::test]
async fn test_rejected_mint_leaves_stored_account() {
    let t = setup_test_app().await;
    let put_product = ProductDescriptor::new(1, 1, AssetId(1), AssetId(2), AssetId(1)).encode();
    let put = TokenId::encode(
        SettlementType::Cash,
        OptionType::Put,
        put_product,
        EXPIRY,
        1_500_000_000,
        0,
    );

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/mint",
        json!({"tokenId": put.to_hex(), "amount": "1"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "cannot mint option with this collateral");

    let account = t.repo.account(&Address::new("0xalice")).await.unwrap();
    assert!(account.is_empty());
}

#[tokio::test]
async fn test_foreign_engine_token_rejected() {
    let t = setup_test_app().await;
    let product = ProductDescriptor::new(7, 1, AssetId(1), AssetId(2), AssetId(1)).encode();
    let call = TokenId::encode(SettlementType::Cash, OptionType::Call, product, EXPIRY, 1, 0);
    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xalice/mint",
        json!({"tokenId": call.to_hex(), "amount": "1"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_bad_inputs_are_bad_requests() {
    let t = setup_test_app().await;
    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xalice/mint",
        json!({"tokenId": "0xzz", "amount": "1"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xalice/settle",
        json!({"payout": "lots"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&t.app, "/v1/transfers?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_settle_at_expiry_endpoint() {
    let t = setup_test_app().await;
    let call = cash_call(2_000_000_000);
    post(
        &t.app,
        "/v1/accounts/0xalice/collateral/add",
        json!({"assetId": 1, "amount": "1000", "from": "0xalice"}),
    )
    .await;
    post(
        &t.app,
        "/v1/accounts/0xalice/mint",
        json!({"tokenId": call.to_hex(), "amount": "5"}),
    )
    .await;

    let (status, body) = post(
        &t.app,
        "/v1/accounts/0xalice/settle",
        json!({"payout": "-250"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shortCallAmount"], "0");
    assert_eq!(body["collateralAmount"], "1250");
}

#[tokio::test]
async fn test_issuer_registration() {
    let t = setup_test_app().await;
    let (status, body) = post(&t.app, "/v1/issuers", json!({"principal": "0xissuer"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issuerId"], 1);

    let (status, body) = post(&t.app, "/v1/issuers", json!({"principal": "0xissuer"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "issuer already registered");

    let (status, body) = post(&t.app, "/v1/issuers", json!({"principal": "0xother"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["issuerId"], 2);

    let (status, body) = get(&t.app, "/v1/issuers/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["principal"], "0xissuer");

    let (status, _) = get(&t.app, "/v1/issuers/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // A fresh service over the same database sees the same registry.
    let reloaded = t.repo.issuer_registry().await.unwrap();
    assert_eq!(reloaded.last_id(), 2);
}

#[tokio::test]
async fn test_token_encode_checks_strikes() {
    let t = setup_test_app().await;
    let product = json!({"oracleId": 1, "underlyingId": 1, "strikeId": 2, "collateralId": 1});

    let (status, body) = post(
        &t.app,
        "/v1/tokens/encode",
        json!({
            "settlementType": "cash",
            "optionType": "call",
            "product": product,
            "expiry": EXPIRY,
            "longStrike": 2_000_000_000u64,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenId"], cash_call(2_000_000_000).to_hex());

    let (status, body) = post(
        &t.app,
        "/v1/tokens/encode",
        json!({
            "settlementType": "cash",
            "optionType": "callSpread",
            "product": product,
            "expiry": EXPIRY,
            "longStrike": 2_500_000_000u64,
            "shortStrike": 2_000_000_000u64,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "bad strikes");

    let (status, _) = post(
        &t.app,
        "/v1/tokens/encode",
        json!({
            "settlementType": "physical",
            "optionType": "put",
            "product": product,
            "expiry": EXPIRY,
            "longStrike": 1_500_000_000u64,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_physical_settlement_flow() {
    let t = setup_test_app().await;
    post(&t.app, "/v1/issuers", json!({"principal": "0xissuer"})).await;

    let product = json!({"oracleId": 1, "underlyingId": 1, "strikeId": 2, "collateralId": 1});
    let (status, body) = post(
        &t.app,
        "/v1/tokens/encode",
        json!({
            "settlementType": "physical",
            "optionType": "call",
            "product": product,
            "expiry": EXPIRY,
            "longStrike": 2_000_000_000u64,
            "issuerId": 1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token_id = body["tokenId"].as_str().unwrap().to_string();

    post(
        &t.app,
        "/v1/accounts/0xissuer/collateral/add",
        json!({"assetId": 1, "amount": ONE_WETH.to_string(), "from": "0xissuer"}),
    )
    .await;
    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xissuer/mint",
        json!({"tokenId": token_id, "amount": "1000000"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, terms) = get(
        &t.app,
        &format!("/v1/settlements/terms?tokenId={}&at={}", token_id, EXPIRY + 10),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(terms["debtAssetId"], 2);
    assert_eq!(terms["debtPerToken"], "2000000000");
    assert_eq!(terms["payoutAssetId"], 1);
    assert_eq!(terms["payoutPerToken"], ONE_WETH.to_string());

    let (status, late) = get(
        &t.app,
        &format!("/v1/settlements/terms?tokenId={}&at={}", token_id, EXPIRY + 3_601),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(late["debtPerToken"], "0");

    let mut settlement = terms.clone();
    settlement["tokenAmount"] = json!("1000000");
    settlement["debtor"] = json!("0xholder");
    settlement["creditor"] = json!("0xholder");

    let (status, _) = post(
        &t.app,
        "/v1/settlements/physical",
        json!({"caller": "0xholder", "settlement": settlement}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, receipt) = post(
        &t.app,
        "/v1/settlements/physical",
        json!({"caller": "0xdriver", "settlement": settlement}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["issuer"], "0xissuer");
    assert_eq!(receipt["debt"], "2000000000");
    assert_eq!(receipt["payout"], ONE_WETH.to_string());
    assert_eq!(receipt["debtToAccount"], true);

    let (_, account) = get(&t.app, "/v1/accounts/0xissuer").await;
    assert_eq!(account["shortCallAmount"], "0");
    assert_eq!(account["collateralId"], 2);
    assert_eq!(account["collateralAmount"], "2000000000");

    let transfers = t
        .repo
        .query_transfers(Some(&Address::new("0xissuer")), 0, 10)
        .await
        .unwrap();
    let settled: Vec<_> = transfers
        .iter()
        .filter(|r| r.operation == "settle_physical")
        .collect();
    assert_eq!(settled.len(), 2);
    assert_eq!(settled[0].from, Address::new("0xholder"));
    assert_eq!(settled[0].to, Address::new("marginbook"));
    assert_eq!(settled[1].to, Address::new("0xholder"));

    let (status, batch) = post(
        &t.app,
        "/v1/settlements/terms/batch",
        json!({"tokenIds": [token_id], "at": EXPIRY}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(batch.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_settlement_terms_reject_cash_tokens() {
    let t = setup_test_app().await;
    let (status, body) = get(
        &t.app,
        &format!("/v1/settlements/terms?tokenId={}&at={}", cash_call(1).to_hex(), EXPIRY),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid settlement type");
}

#[tokio::test]
async fn test_physical_settle_rejects_cash_token() {
    let t = setup_test_app().await;
    post(&t.app, "/v1/issuers", json!({"principal": "0xissuer"})).await;

    // Cash spread whose short strike carries issuer 1 in its low bits.
    let product = ProductDescriptor::new(1, 1, AssetId(1), AssetId(2), AssetId(1)).encode();
    let spread = TokenId::encode(
        SettlementType::Cash,
        OptionType::CallSpread,
        product,
        EXPIRY,
        100,
        65_537,
    );
    post(
        &t.app,
        "/v1/accounts/0xissuer/collateral/add",
        json!({"assetId": 1, "amount": "10", "from": "0xissuer"}),
    )
    .await;
    let (status, _) = post(
        &t.app,
        "/v1/accounts/0xissuer/mint",
        json!({"tokenId": spread.to_hex(), "amount": "5"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let before = t.repo.account(&Address::new("0xissuer")).await.unwrap();

    let settlement = json!({
        "tokenId": spread.to_hex(),
        "tokenAmount": "5",
        "debtAssetId": 2,
        "debtPerToken": "0",
        "payoutAssetId": 1,
        "payoutPerToken": "1000000",
        "debtor": "0xholder",
        "creditor": "0xholder",
    });
    let (status, body) = post(
        &t.app,
        "/v1/settlements/physical",
        json!({"caller": "0xdriver", "settlement": settlement}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid settlement type");

    let after = t.repo.account(&Address::new("0xissuer")).await.unwrap();
    assert_eq!(after, before);
    let transfers = t
        .repo
        .query_transfers(Some(&Address::new("0xissuer")), 0, 10)
        .await
        .unwrap();
    assert!(transfers.iter().all(|r| r.operation != "settle_physical"));
}
