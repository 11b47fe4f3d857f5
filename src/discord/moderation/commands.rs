// Moderation slash commands - configuration and manual actions.

use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// Longest timeout Discord accepts, in minutes (28 days).
const MAX_TIMEOUT_MINUTES: u32 = 40_320;

/// Configure moderation settings. Values outside the allowed range are clamped.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn modconfig(
    ctx: Context<'_>,
    #[description = "Number of messages before spam detection (default: 5)"]
    spam_threshold: Option<u32>,
    #[description = "Timeframe in seconds for spam detection (default: 10)"]
    spam_timeframe: Option<u32>,
    #[description = "Warnings before a timeout (default: 3)"] max_warnings: Option<u32>,
) -> Result<(), Error> {
    let settings = ctx
        .data()
        .moderation
        .update_settings(spam_threshold, spam_timeframe, max_warnings);

    tracing::info!(
        admin_id = ctx.author().id.get(),
        spam_threshold = settings.spam_message_threshold,
        spam_window_secs = settings.spam_window_secs,
        max_warnings = settings.max_warnings,
        "Moderation settings updated"
    );

    let embed = serenity::CreateEmbed::new()
        .title("🔧 Moderation Configuration")
        .color(serenity::Color::BLUE)
        .field(
            "Spam Threshold",
            format!("{} messages", settings.spam_message_threshold),
            true,
        )
        .field(
            "Spam Timeframe",
            format!("{} seconds", settings.spam_window_secs),
            true,
        )
        .field("Max Warnings", settings.max_warnings.to_string(), true);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Reset a user's moderation warnings.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn clearwarnings(
    ctx: Context<'_>,
    #[description = "User to clear warnings for"] user: serenity::User,
) -> Result<(), Error> {
    let moderation = &ctx.data().moderation;
    let previous = moderation.user_warnings(user.id.get()).await;
    moderation.clear_user_warnings(user.id.get()).await;

    ctx.send(
        poise::CreateReply::default()
            .content(format!(
                "✅ Cleared {} warning{} for <@{}>.",
                previous,
                if previous == 1 { "" } else { "s" },
                user.id
            ))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Clear messages from the channel.
#[poise::command(slash_command, guild_only, required_permissions = "MANAGE_MESSAGES")]
pub async fn clear(
    ctx: Context<'_>,
    #[description = "Number of messages to delete (1-100)"] amount: u8,
) -> Result<(), Error> {
    if !(1..=100).contains(&amount) {
        ctx.send(
            poise::CreateReply::default()
                .content("❌ Amount must be between 1 and 100.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    ctx.defer_ephemeral().await?;

    let channel_id = ctx.channel_id();
    let messages = channel_id
        .messages(ctx.http(), serenity::GetMessages::new().limit(amount))
        .await?;
    let ids: Vec<serenity::MessageId> = messages.iter().map(|m| m.id).collect();

    let reply = match ids.len() {
        0 => "Nothing to delete.".to_string(),
        1 => match channel_id.delete_message(ctx.http(), ids[0]).await {
            Ok(()) => "✅ Deleted 1 message.".to_string(),
            Err(e) => {
                tracing::warn!("Failed to delete message: {}", e);
                "❌ I don't have permission to delete messages.".to_string()
            }
        },
        n => match channel_id.delete_messages(ctx.http(), &ids).await {
            Ok(()) => format!("✅ Deleted {} messages.", n),
            Err(e) => {
                tracing::warn!("Failed to bulk delete messages: {}", e);
                "❌ Couldn't delete those messages (missing permission, or older than 14 days)."
                    .to_string()
            }
        },
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Timeout a user.
#[poise::command(slash_command, guild_only, required_permissions = "MODERATE_MEMBERS")]
pub async fn timeout(
    ctx: Context<'_>,
    #[description = "The member to timeout"] member: serenity::Member,
    #[description = "Duration in minutes"] duration: u32,
    #[description = "Reason for timeout"] reason: Option<String>,
) -> Result<(), Error> {
    if !(1..=MAX_TIMEOUT_MINUTES).contains(&duration) {
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "❌ Duration must be between 1 minute and 28 days ({} minutes).",
                    MAX_TIMEOUT_MINUTES
                ))
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
    let until = serenity::Timestamp::from_unix_timestamp(
        chrono::Utc::now().timestamp() + i64::from(duration) * 60,
    )?;

    let result = member
        .guild_id
        .edit_member(
            ctx.http(),
            member.user.id,
            serenity::EditMember::new()
                .disable_communication_until_datetime(until)
                .audit_log_reason(&reason),
        )
        .await;

    let reply = match result {
        Ok(_) => format!(
            "✅ <@{}> has been timed out for {} minutes.\nReason: {}",
            member.user.id, duration, reason
        ),
        Err(e) => {
            tracing::error!(user_id = member.user.id.get(), "Failed to timeout user: {}", e);
            "❌ I don't have permission to timeout that user.".to_string()
        }
    };

    ctx.send(poise::CreateReply::default().content(reply).ephemeral(true))
        .await?;
    Ok(())
}
