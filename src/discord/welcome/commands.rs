use super::member_events::send_card;
use crate::core::welcome::{CardTemplate, MemberEvent};
use crate::discord::{Context, Error};

/// Preview the welcome card for yourself in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn testwelcome(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let Some(member) = ctx.author_member().await else {
        ctx.say("❌ Couldn't look up your membership.").await?;
        return Ok(());
    };

    let member_count = ctx
        .guild()
        .map(|g| g.member_count)
        .unwrap_or_default();

    let event = MemberEvent {
        guild_id: member.guild_id.get(),
        user_id: member.user.id.get(),
        display_name: member.display_name().to_string(),
        avatar_url: member.face(),
        // A preview is always for the person asking
        is_bot: false,
        joined_at: member.joined_at.map(|t| t.unix_timestamp()),
        member_count,
    };

    let post = ctx
        .data()
        .welcome
        .card_in(ctx.channel_id().get(), &event, CardTemplate::Welcome)
        .await;

    match post {
        Some(post) => {
            send_card(ctx.serenity_context(), post).await?;
            ctx.say("✅ Test welcome card sent.").await?;
        }
        None => {
            ctx.say("❌ Nothing to preview.").await?;
        }
    }
    Ok(())
}
