//! General Discord commands - ping and help.
//! These commands do not touch the sync engine.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command, prefix_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**Budget Sync Help**\n\
        Offline families live on this device until you move them to the cloud.\n\n\
        **Sync Commands**\n\
        • `/sync` - Sends queued changes of cloud families to the cloud.\n\
        • `/sync_family <family>` - Moves an offline family and all its data to the cloud.\n\
        • `/sync_status` - Shows connectivity, pending changes and migration progress.\n\
        • `/families` - Lists offline and cloud families.\n\n\
        **Utility Commands**\n\
        • `/ping` - Checks if the bot is responsive.\n\
        • `/help` - Shows this help message.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
