// Reads guild counts out of the cache and flushes pending stats refreshes.

use crate::core::server_stats::GuildCounts;
use crate::discord::StatsService;
use poise::serenity_prelude as serenity;

/// Counts from the cache. The member list may be partial, so humans are
/// derived as total minus the bots we can see.
pub fn guild_counts(cache: &serenity::Cache, guild_id: serenity::GuildId) -> Option<GuildCounts> {
    let guild = cache.guild(guild_id)?;
    Some(GuildCounts {
        total_members: guild.member_count,
        bots: guild.members.values().filter(|m| m.user.bot).count() as u64,
        boosts: guild.premium_subscription_count.unwrap_or(0),
    })
}

/// Refresh every guild marked dirty since the last flush.
pub async fn flush_dirty(cache: &serenity::Cache, stats: &StatsService) {
    for guild_id in stats.take_dirty() {
        let Some(counts) = guild_counts(cache, serenity::GuildId::new(guild_id)) else {
            // Not cached yet; try again next round
            stats.mark_dirty(guild_id);
            continue;
        };

        if let Err(e) = stats.refresh(guild_id, &counts).await {
            tracing::warn!(guild_id, "Server stats refresh failed: {}", e);
        }
    }
}
