use anyhow::Context;
use anyhow::Result;
use capbudg_tables::server;
use capbudg_tables::server::AppState;
use capbudg_tables::spreadsheet::load_grid;
use capbudg_tables::Config;
use capbudg_tables::TableRegistry;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "capbudg_tables=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();
    info!(file = %config.file.display(), sheet = ?config.sheet, "starting");

    let grid = load_grid(&config.file, config.sheet.as_deref())
        .with_context(|| format!("Failed to load workbook {}", config.file.display()))?;
    let layouts = config.layouts().context("Failed to load table layouts")?;
    let registry = TableRegistry::build(&grid, &layouts).context("Failed to build tables")?;

    let app = server::router(AppState::new(registry));

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
