//! Bot layer - Discord interface to the sync engine.
//!
//! Slash commands for flushing the queue, migrating offline families and inspecting
//! sync state, plus the autocomplete handlers they use.

/// Discord command implementations (general, sync)
pub mod commands;
/// Discord interaction handlers (autocomplete)
pub mod handlers;

use crate::{core::sync::SyncEngine, errors::Error};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands.
pub struct BotData {
    /// The sync engine the commands drive
    pub engine: Arc<SyncEngine>,
    /// How long the final migration progress stays visible
    pub progress_clear_delay: Duration,
}

impl BotData {
    /// Creates the shared command context.
    #[must_use]
    pub const fn new(engine: Arc<SyncEngine>, progress_clear_delay: Duration) -> Self {
        Self {
            engine,
            progress_clear_delay,
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error}", ctx.command().name);
            if let Err(e) = ctx.say(format!("An error occurred: {error}")).await {
                error!("Failed to send error message: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Connects to Discord and serves commands until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(token: &str, data: BotData) -> Result<(), Error> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::ping(),
                commands::help(),
                commands::sync(),
                commands::sync_status(),
                commands::families(),
                commands::sync_family(),
            ],
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Registered commands globally");
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::Client::builder(token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot client...");
    client.start().await?;
    Ok(())
}
