use anyhow::Context;
use marginbook::{api, config::Config, db::init_db, MarginService, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .with_context(|| format!("failed to open ledger database {}", config.database_path))?;
    let repo = Arc::new(Repository::new(pool));
    let service = Arc::new(
        MarginService::load(repo.clone(), &config)
            .await
            .context("failed to load ledger state")?,
    );

    tracing::info!(
        engine = %config.engine_address,
        engine_id = config.engine_id,
        assets = config.assets.len(),
        window_secs = config.settlement_window_secs,
        "Margin engine configured"
    );

    let app = api::create_router(api::AppState::new(repo, config, service));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
