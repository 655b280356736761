use std::net::SocketAddr;
use std::sync::Arc;

use stockflow_api::{
    app,
    state::{AppState, AuthConfig},
};
use stockflow_core::identity::StaticApproverDirectory;
use stockflow_store::{DbClient, PgProductCatalog, PgStockLedger, PgTransferRepository};
use stockflow_transfer::{TransferQueryService, TransferService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockflow_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = stockflow_store::app_config::Config::load()?;
    tracing::info!("Starting Stockflow API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url).await?;
    db.migrate().await?;

    let repo = Arc::new(PgTransferRepository::new(db.pool.clone()));
    let ledger = Arc::new(PgStockLedger::new(db.pool.clone()));
    let catalog = Arc::new(PgProductCatalog::new(db.pool.clone()));
    let approvers = Arc::new(StaticApproverDirectory::with_approvers(
        config.transfer.approver_ids.clone(),
    ));

    let app_state = AppState {
        transfers: Arc::new(TransferService::new(
            repo.clone(),
            ledger.clone(),
            approvers,
        )),
        queries: Arc::new(TransferQueryService::new(repo)),
        ledger,
        catalog,
        auth: AuthConfig {
            secret: config.auth.jwt_secret.clone(),
            expiration: config.auth.jwt_expiration_seconds,
        },
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
