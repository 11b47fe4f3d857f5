use super::refresh::guild_counts;
use crate::core::server_stats::{StatKind, StatsChannels, StatsError};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Manage server statistics channels
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    subcommands("setup", "remove", "status")
)]
pub async fn serverstats(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create a locked category with live member counters
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setup(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;
    let stats = &ctx.data().server_stats;

    ctx.defer().await?;

    if stats.config(guild_id.get()).await?.is_some() {
        ctx.say("❌ Server stats are already set up here. Use `/serverstats remove` first.")
            .await?;
        return Ok(());
    }

    let counts = guild_counts(ctx.cache(), guild_id).ok_or("Guild not cached yet")?;

    let category = guild_id
        .create_channel(
            ctx.http(),
            serenity::CreateChannel::new("📊 SERVER STATS")
                .kind(serenity::ChannelType::Category),
        )
        .await?;

    // Counter channels are voice channels nobody can join; @everyone's role id is the guild id
    let locked = vec![serenity::PermissionOverwrite {
        allow: serenity::Permissions::empty(),
        deny: serenity::Permissions::CONNECT,
        kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
    }];

    let mut counter_ids = Vec::with_capacity(StatKind::ALL.len());
    for kind in StatKind::ALL {
        let channel = guild_id
            .create_channel(
                ctx.http(),
                serenity::CreateChannel::new(kind.label(counts.get(kind)))
                    .kind(serenity::ChannelType::Voice)
                    .category(category.id)
                    .permissions(locked.clone()),
            )
            .await?;
        counter_ids.push(channel.id.get());
    }

    let channels = StatsChannels {
        guild_id: guild_id.get(),
        category_id: category.id.get(),
        total_members_channel_id: counter_ids[0],
        humans_channel_id: counter_ids[1],
        bots_channel_id: counter_ids[2],
        boosts_channel_id: counter_ids[3],
    };
    stats.register(channels, &counts).await?;

    tracing::info!(guild_id = guild_id.get(), "Server stats channels created");
    ctx.say("✅ Server stats channels are set up and will refresh every few minutes.")
        .await?;
    Ok(())
}

/// Delete the stats channels
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn remove(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;

    ctx.defer().await?;

    let channels = match ctx.data().server_stats.unregister(guild_id.get()).await {
        Ok(channels) => channels,
        Err(StatsError::NotConfigured) => {
            ctx.say("❌ Server stats are not set up here.").await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    for channel_id in channels.all_channel_ids() {
        if let Err(e) = serenity::ChannelId::new(channel_id).delete(ctx.http()).await {
            tracing::warn!(channel_id, "Failed to delete stats channel: {}", e);
        }
    }

    ctx.say("✅ Server stats channels removed.").await?;
    Ok(())
}

/// Show the stats channels and the current counts
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn status(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("Must be in a guild")?;

    let Some(channels) = ctx.data().server_stats.config(guild_id.get()).await? else {
        ctx.say("❌ Server stats are not set up here.").await?;
        return Ok(());
    };

    let counts = guild_counts(ctx.cache(), guild_id).unwrap_or_default();

    let embed = StatKind::ALL.iter().fold(
        serenity::CreateEmbed::new()
            .title("📊 Server Stats")
            .color(0x3498db)
            .field("Category", format!("<#{}>", channels.category_id), false),
        |embed, kind| {
            embed.field(
                kind.label(counts.get(*kind)),
                format!("<#{}>", channels.channel_for(*kind)),
                true,
            )
        },
    );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
