use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Make an announcement in this channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn announce(
    ctx: Context<'_>,
    #[description = "The announcement message"] content: String,
) -> Result<(), Error> {
    let content = content.trim();
    if content.is_empty() {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ The announcement can't be empty.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("📢 Announcement")
        .description(content)
        .color(serenity::Color::GOLD)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Posted by {}",
            ctx.author().name
        )))
        .timestamp(serenity::Timestamp::now());

    ctx.channel_id()
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(embed))
        .await?;

    tracing::info!(
        author_id = ctx.author().id.get(),
        channel_id = ctx.channel_id().get(),
        "Announcement posted"
    );

    ctx.send(
        poise::CreateReply::default()
            .content("✅ Announcement sent!")
            .ephemeral(true),
    )
    .await?;
    Ok(())
}
