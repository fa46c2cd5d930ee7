use clap::Parser;
use repset_core::{Config, MemoryRemoteStore, Result};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "repset-server")]
#[command(about = "In-memory workout history backend", long_about = None)]
struct Cli {
    /// Address to listen on (default from config, 0.0.0.0:5000)
    #[arg(long)]
    bind: Option<String>,

    /// Use this config file instead of the default one
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    repset_core::logging::init_with_level("info");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let bind = cli.bind.unwrap_or(config.server.bind);

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    let store = Arc::new(MemoryRemoteStore::new());

    repset_server::serve(listener, store, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutting down");
    })
    .await?;

    Ok(())
}
