use anyhow::Context;
use markprice::catalog::PricingCatalog;
use markprice::{api, config::Config, db::init_db, Repository};
use std::net::SocketAddr;
use std::path::Path;
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

    let config = Config::from_env().context("Configuration error")?;
    let port = config.port;

    let pool = init_db(&config.database_path)
        .await
        .context("Failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    if let Some(path) = config.catalog_path.as_deref() {
        let catalog = PricingCatalog::from_path(Path::new(path))
            .with_context(|| format!("Failed to load catalog {}", path))?;
        let written = repo
            .import_catalog(&catalog)
            .await
            .context("Failed to import catalog")?;
        tracing::info!(path = %path, entries = written, "Imported pricing catalog");
    }

    let app = api::create_router(api::AppState::new(repo, config));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
