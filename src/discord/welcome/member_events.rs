// Member join/leave glue for welcome cards.

use crate::core::welcome::{CardPost, MemberEvent};
use crate::discord::Data;
use anyhow::Result;
use poise::serenity_prelude::{self as serenity, Context};

pub async fn handle_member_join(
    ctx: &Context,
    data: &Data,
    member: &serenity::Member,
) -> Result<()> {
    let event = MemberEvent {
        guild_id: member.guild_id.get(),
        user_id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        avatar_url: member.face(),
        is_bot: member.user.bot,
        joined_at: member.joined_at.map(|t| t.unix_timestamp()),
        member_count: member_count(ctx, member.guild_id),
    };

    if let Some(post) = data.welcome.welcome_card(&event).await {
        send_card(ctx, post).await?;
        tracing::info!(
            user_id = event.user_id,
            guild_id = event.guild_id,
            "Posted welcome card"
        );
    }
    Ok(())
}

pub async fn handle_member_remove(
    ctx: &Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    member_data: Option<&serenity::Member>,
) -> Result<()> {
    let display_name = member_data
        .map(|m| m.display_name().to_string())
        .or_else(|| user.global_name.clone())
        .unwrap_or_else(|| user.name.clone());

    let event = MemberEvent {
        guild_id: guild_id.get(),
        user_id: user.id.get(),
        display_name,
        avatar_url: user.face(),
        is_bot: user.bot,
        joined_at: member_data
            .and_then(|m| m.joined_at)
            .map(|t| t.unix_timestamp()),
        member_count: member_count(ctx, guild_id),
    };

    if let Some(post) = data.welcome.leave_card(&event).await {
        send_card(ctx, post).await?;
    }
    Ok(())
}

/// Post a card, attaching the rendered image when there is one.
pub async fn send_card(ctx: &Context, post: CardPost) -> Result<()> {
    let mut embed = serenity::CreateEmbed::new()
        .title(post.title)
        .description(post.description)
        .color(post.colour)
        .footer(serenity::CreateEmbedFooter::new(post.footer))
        .timestamp(serenity::Timestamp::now());

    for (name, value, inline) in post.fields {
        embed = embed.field(name, value, inline);
    }

    let mut message = serenity::CreateMessage::new();
    if let Some(mention) = post.mention {
        message = message.content(mention);
    }
    if let Some(bytes) = post.image {
        embed = embed.image(format!("attachment://{}", post.image_name));
        message = message.add_file(serenity::CreateAttachment::bytes(bytes, post.image_name));
    }

    serenity::ChannelId::new(post.channel_id)
        .send_message(&ctx.http, message.embed(embed))
        .await?;
    Ok(())
}

fn member_count(ctx: &Context, guild_id: serenity::GuildId) -> u64 {
    ctx.cache
        .guild(guild_id)
        .map(|g| g.member_count)
        .unwrap_or(0)
}
