//! Autocomplete handlers for Discord slash command parameters.

use crate::{bot::BotData, core::ids::is_offline_id, entities::family, errors::Error};

/// Discord's autocomplete limit.
const MAX_CHOICES: usize = 25;

/// Offline families whose name or id contains `partial`, as choices whose value is the
/// family id.
pub fn matching_offline_families(
    families: Vec<family::Model>,
    partial: &str,
) -> Vec<poise::serenity_prelude::AutocompleteChoice> {
    let partial_lower = partial.to_lowercase();
    families
        .into_iter()
        .filter(|f| is_offline_id(&f.id))
        .filter(|f| f.name.to_lowercase().contains(&partial_lower) || f.id.contains(partial))
        .take(MAX_CHOICES)
        .map(|f| poise::serenity_prelude::AutocompleteChoice::new(f.name, f.id))
        .collect()
}

/// Suggests local offline families for `/sync_family`.
pub async fn autocomplete_offline_family(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<poise::serenity_prelude::AutocompleteChoice> {
    let Ok(families) = ctx.data().engine.local().families().await else {
        return Vec::new();
    };
    matching_offline_families(families, partial)
}
