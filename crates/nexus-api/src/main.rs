use anyhow::Context;
use clap::Parser;
use nexus_api::{router, AppState};
use nexus_core::Settings;
use nexus_db::Store;
use nexus_extract::Extractor;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "nexus-api", version, about = "Run the Nexus API server")]
struct Cli {
    /// Host to bind (overrides API_HOST)
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (overrides PORT / API_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,nexus_api=debug,nexus_db=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env();
    if let Some(host) = cli.host {
        settings.api_host = host;
    }
    if let Some(port) = cli.port {
        settings.api_port = port;
    }

    let store = Store::connect(&settings.database_url)
        .await
        .with_context(|| format!("opening database {}", settings.database_url))?
        .with_max_recent_tags(settings.max_recent_tags);
    store.migrate().await.context("applying migrations")?;

    let extractor = Extractor::new(&settings.ai);
    if extractor.is_available() {
        tracing::info!(provider = %settings.ai.provider, model = %settings.ai.model, "language model enabled");
    }

    let addr = format!("{}:{}", settings.api_host, settings.api_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, environment = %settings.environment, "nexus api listening");

    let app = router(AppState::new(store, extractor, settings));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
