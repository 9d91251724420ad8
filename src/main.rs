use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use listing_market::config::AppConfig;
use listing_market::routes::{self, SharedStore};
use listing_market::{InMemoryListingRepository, MongoListingRepository};

#[derive(Parser, Debug)]
#[command(name = "listing-market", about = "Marketplace listing service")]
struct Cli {
    /// Config file, with or without the .toml extension
    #[arg(long, default_value = "config/config")]
    config: String,

    /// Keep listings in process memory instead of MongoDB
    #[arg(long)]
    in_memory: bool,
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let store: SharedStore = if cli.in_memory {
        info!("using in-memory listing store");
        Arc::new(InMemoryListingRepository::new())
    } else {
        let config = AppConfig::load(&cli.config).context("failed to load configuration")?;
        let repo = MongoListingRepository::connect(&config.mongo)
            .await
            .context("failed to connect to MongoDB")?;
        info!(
            database = %config.mongo.database,
            collection = %config.mongo.collection,
            "connected to MongoDB"
        );
        Arc::new(repo)
    };

    if let Err(err) = routes::build(store).launch().await {
        anyhow::bail!("server stopped: {err}");
    }
    Ok(())
}
