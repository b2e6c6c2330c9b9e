//! Sync Discord commands - queue flush, family migration and sync status.
//!
//! The message builders are plain functions so they can be tested without Discord.

use crate::core::sync::{FlushReport, SyncProgress};
use crate::entities::family;
use crate::errors::{Error, Result};
use std::fmt::Write;

/// Reply for `/sync`.
#[must_use]
pub fn format_flush_report(report: FlushReport, pending: u64) -> String {
    let mut text = format!("🔄 Sync finished: {} change(s) sent", report.applied);
    if report.failed > 0 {
        let _ = write!(text, ", {} failed and will be retried", report.failed);
    }
    if report.skipped > 0 {
        let _ = write!(
            text,
            ", {} belong to offline families and wait for `/sync_family`",
            report.skipped
        );
    }
    let _ = write!(text, ".\nPending changes: {pending}");
    text
}

/// Reply for `/sync_status`.
#[must_use]
pub fn format_status(
    online: bool,
    syncing: bool,
    pending: u64,
    progress: Option<&SyncProgress>,
) -> String {
    let mut text = format!(
        "**Connectivity:** {}\n**Syncing:** {}\n**Pending changes:** {pending}",
        if online { "🟢 online" } else { "🔴 offline" },
        if syncing { "yes" } else { "no" },
    );
    if let Some(progress) = progress {
        let _ = write!(text, "\n**Progress:** {progress}");
    }
    text
}

/// Reply for `/families`.
#[must_use]
pub fn format_families(offline: &[family::Model], cloud: Option<&[family::Model]>) -> String {
    let mut text = String::from("**Offline families**\n");
    if offline.is_empty() {
        text.push_str("None\n");
    }
    for family in offline {
        let _ = writeln!(text, "• {} (`{}`)", family.name, family.id);
    }

    text.push_str("\n**Cloud families**\n");
    match cloud {
        None => text.push_str("Unavailable (offline or signed out)"),
        Some([]) => text.push_str("None"),
        Some(families) => {
            for family in families {
                let _ = writeln!(text, "• {}", family.name);
            }
        }
    }
    text.trim_end().to_string()
}

/// Reply for `/sync_family`.
#[must_use]
pub fn format_migration_result(name: &str, result: &Result<String>) -> String {
    match result {
        Ok(new_id) => format!("✅ Family **{name}** is now in the cloud (`{new_id}`)."),
        Err(e @ Error::MigrationFailed { .. }) => format!(
            "❌ {e}\nThe partial cloud copy was removed and your local data is unchanged. You can retry."
        ),
        Err(e) => format!("❌ Could not sync family **{name}**: {e}"),
    }
}

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use super::{format_families, format_flush_report, format_migration_result, format_status};
    use crate::{
        bot::{BotData, handlers::autocomplete},
        entities::Family,
        errors::{Error, Result},
    };
    use tracing::warn;

    /// Sends queued changes of cloud families to the cloud.
    #[poise::command(slash_command, prefix_command)]
    pub async fn sync(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let engine = &ctx.data().engine;
        if !engine.session().is_authenticated() {
            ctx.say("🔒 Sign in to sync with the cloud.").await?;
            return Ok(());
        }
        if !engine.is_online() {
            ctx.say(format!(
                "📴 Offline. {} change(s) will be sent when the connection is back.",
                engine.pending_sync_count()
            ))
            .await?;
            return Ok(());
        }

        ctx.defer().await?;
        let report = engine.sync_now().await?;
        ctx.say(format_flush_report(report, engine.pending_sync_count()))
            .await?;
        Ok(())
    }

    /// Shows connectivity, pending changes and migration progress.
    #[poise::command(slash_command, prefix_command)]
    pub async fn sync_status(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let engine = &ctx.data().engine;
        let progress = engine.sync_progress();
        ctx.say(format_status(
            engine.is_online(),
            engine.is_syncing(),
            engine.pending_sync_count(),
            progress.as_ref(),
        ))
        .await?;
        Ok(())
    }

    /// Lists offline families on this device and cloud families of the signed-in user.
    #[poise::command(slash_command, prefix_command)]
    pub async fn families(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let engine = &ctx.data().engine;
        let offline = engine.local().families().await?;

        let cloud = match engine.session().current() {
            Some(session) if engine.is_online() => {
                match engine.remote().list_families_for_user(&session.user_id).await {
                    Ok(families) => Some(families),
                    Err(e) => {
                        warn!(error = %e, "Failed to list cloud families");
                        None
                    }
                }
            }
            _ => None,
        };

        ctx.say(format_families(&offline, cloud.as_deref())).await?;
        Ok(())
    }

    /// Moves an offline family and all its data to the cloud.
    #[poise::command(slash_command, prefix_command)]
    pub async fn sync_family(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Offline family to move to the cloud"]
        #[autocomplete = "autocomplete::autocomplete_offline_family"]
        family: String,
    ) -> Result<()> {
        let data = ctx.data();
        let engine = &data.engine;

        let name = engine
            .local()
            .get::<Family>(&family)
            .await?
            .map_or_else(|| family.clone(), |f| f.name);

        ctx.defer().await?;
        let result = engine.sync_family(&family).await;
        engine.schedule_progress_clear(data.progress_clear_delay);

        ctx.say(format_migration_result(&name, &result)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
