// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `donna serve` command implementation.
//!
//! Wires up SQLite storage, the Google OAuth token store, the calendar
//! tool registry, the Anthropic provider, and the Telegram channel, then
//! enters the agent loop until SIGINT/SIGTERM.

use std::sync::Arc;

use donna_agent::commands::CommandHandler;
use donna_agent::session::SessionEngine;
use donna_agent::{shutdown, AgentLoop};
use donna_anthropic::AnthropicProvider;
use donna_calendar::{CalendarClient, OAuthClient, TokenStore};
use donna_config::model::DonnaConfig;
use donna_core::{ChannelAdapter, DonnaError, StorageAdapter};
use donna_storage::SqliteStorage;
use donna_telegram::TelegramChannel;
use donna_tools::ToolRegistry;
use tracing::info;

/// Runs the `donna serve` command.
pub async fn run_serve(config: DonnaConfig) -> Result<(), DonnaError> {
    init_tracing(&config.agent.log_level);

    info!(agent = %config.agent.name, "starting donna serve");

    let storage: Arc<dyn StorageAdapter> = {
        let storage = SqliteStorage::new(config.storage.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };

    let oauth = OAuthClient::new(&config.google)?;
    let tokens = Arc::new(TokenStore::new(
        Arc::clone(&storage),
        oauth,
        &config.google,
    ));
    let calendar = CalendarClient::new()?;
    let tools = Arc::new(ToolRegistry::new(
        calendar,
        Arc::clone(&tokens),
        &config.session,
    ));

    let provider = Arc::new(AnthropicProvider::new(&config.anthropic)?);

    let channel: Arc<dyn ChannelAdapter> = {
        let mut telegram = TelegramChannel::new(config.telegram.clone())?;
        telegram.connect().await?;
        info!("telegram channel connected");
        Arc::new(telegram)
    };

    let commands = Arc::new(CommandHandler::new(
        Arc::clone(&storage),
        Arc::clone(&tokens),
        Arc::clone(&tools),
        config.agent.name.clone(),
    ));
    let engine = Arc::new(SessionEngine::new(
        Arc::clone(&storage),
        provider,
        tools,
        config,
    ));

    let mut agent_loop = AgentLoop::new(channel, storage, engine, commands);

    let cancel = shutdown::install_signal_handler();
    agent_loop.run(cancel).await?;

    info!("donna serve stopped");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("donna={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
