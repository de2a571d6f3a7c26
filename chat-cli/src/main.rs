//! marketchat: marketplace chat from the command line. Config from env and optional CLI args.

use anyhow::{Context, Result};
use chat::ChatService;
use chat_cli::{open_store, run_command, AppConfig, Cli};
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.store.clone(), cli.database_url.clone())?;
    config.validate().context("Invalid configuration")?;

    chat_core::init_tracing(&config.log_file)?;
    info!(
        store_type = %config.store_type,
        database_url = %config.database_url,
        "marketchat starting"
    );

    let store = open_store(&config).await?;
    let service = ChatService::with_store_profiles(store.clone(), config.chat_config());

    let mut stdout = std::io::stdout();
    run_command(store, &service, cli.command, &mut stdout).await
}
