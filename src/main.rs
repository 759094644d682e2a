use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pantry::config::{LogFormat, PantryConfig};
use pantry::notion::NotionStore;
use pantry::repository::PantryRepository;
use pantry::server::McpServer;
use pantry::tools::PantryTools;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = PantryConfig::from_env().context("Invalid configuration")?;
    init_tracing(config.log_format);

    info!(
        base_url = %config.notion.base_url,
        relations = config.databases.has_relations(),
        "Starting pantry assistant"
    );

    let has_relations = config.databases.has_relations();
    let store = NotionStore::new(config.notion, config.databases)?;
    let mut repo = PantryRepository::new(Arc::new(store));
    if !has_relations {
        repo = repo.without_relations();
    }

    McpServer::new(PantryTools::new(repo)).serve_stdio().await
}
