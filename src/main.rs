//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration and Types
//! - Infrastructure: Discord, PostgreSQL, Logging
//! - Application: Bot core, Router, Help, Modules
//! - Interface: The bundled modules
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use serenity::all::{Client, GatewayIntents};
use std::path::PathBuf;
use std::sync::Arc;

use crate::application::bot::Bot;
use crate::domain::config::AppConfig;
use crate::domain::traits::Storage;
use crate::infrastructure::discord::Handler;
use crate::infrastructure::postgres::PgStorage;
use crate::interface::modules::bundled_modules;
use crate::interface::modules::core_commands::CoreCommands;

#[derive(Parser, Debug)]
#[command(name = "travus-bot", version, about = "Modular Discord bot")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "data/config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Configuration
    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;
    config.apply_env();
    config.validate()?;

    // 2. Logging Setup
    let _log_guard = infrastructure::logging::init(&config.logging)?;
    tracing::info!("Starting Travus Bot...");

    // 3. Database
    let storage = Arc::new(PgStorage::connect(&config.database).await?);

    // 4. Bot Core and Modules
    let token = config.discord.token.clone();
    let bot = Bot::new(config, storage.clone() as Arc<dyn Storage>, bundled_modules());
    bot.init().await?;
    bot.load_core(Arc::new(CoreCommands)).await?;
    bot.load_default_modules().await?;

    // 5. Discord Client
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_PRESENCES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;
    let mut client = Client::builder(&token, intents)
        .event_handler(Handler::new(bot.clone()))
        .await
        .context("Failed to create the Discord client")?;

    // 6. Shutdown on the `shutdown` command or Ctrl+C
    let shard_manager = client.shard_manager.clone();
    let mut shutdown = bot.subscribe_shutdown();
    tokio::spawn(async move {
        tokio::select! {
            _ = shutdown.wait_for(|requested| *requested) => {
                tracing::info!("Shutdown requested.");
            }
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!("Failed to listen for Ctrl+C: {}", e);
                }
                tracing::info!("Received Ctrl+C, shutting down.");
            }
        }
        shard_manager.shutdown_all().await;
    });

    if let Err(e) = client.start().await {
        tracing::error!("Discord client stopped with an error: {}", e);
    }

    bot.on_disconnect().await;
    storage.close().await;
    tracing::info!("Travus Bot stopped.");
    Ok(())
}
