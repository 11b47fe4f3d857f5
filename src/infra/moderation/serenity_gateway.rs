// Serenity-backed implementation of the chat gateway (moderation) and the
// stats channel editor.
//
// Translates between the engine's primitive ids and Discord REST calls, and
// folds serenity's errors into the three outcomes the engine cares about.

use crate::core::moderation::{ChatGateway, GatewayError, Notice, RecentMessage};
use crate::core::server_stats::StatsChannelEditor;
use async_trait::async_trait;
use serenity::all::{
    ChannelId, CreateEmbed, CreateMessage, EditChannel, EditMember, GetMessages, GuildId, MessageId,
    Timestamp, UserId,
};
use serenity::http::Http;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

/// 404 -> NotFound, 403 -> Forbidden, anything else is opaque.
fn classify(err: serenity::Error) -> GatewayError {
    let status = match &err {
        serenity::Error::Http(http_err) => http_err.status_code().map(|s| s.as_u16()),
        _ => None,
    };

    match status {
        Some(404) => GatewayError::NotFound,
        Some(403) => GatewayError::Forbidden,
        _ => GatewayError::Other(err.to_string()),
    }
}

pub fn notice_embed(notice: &Notice) -> CreateEmbed {
    notice.fields.iter().fold(
        CreateEmbed::new()
            .title(&notice.title)
            .description(&notice.description)
            .colour(notice.colour)
            .timestamp(Timestamp::now()),
        |embed, field| embed.field(&field.name, &field.value, field.inline),
    )
}

#[async_trait]
impl ChatGateway for SerenityGateway {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .delete_message(&*self.http, MessageId::new(message_id))
            .await
            .map_err(classify)
    }

    async fn bulk_delete_messages(
        &self,
        channel_id: u64,
        message_ids: &[u64],
    ) -> Result<usize, GatewayError> {
        let ids: Vec<MessageId> = message_ids.iter().map(|id| MessageId::new(*id)).collect();

        ChannelId::new(channel_id)
            .delete_messages(&*self.http, ids)
            .await
            .map_err(classify)?;

        Ok(message_ids.len())
    }

    async fn send_message(&self, channel_id: u64, notice: &Notice) -> Result<u64, GatewayError> {
        let message = ChannelId::new(channel_id)
            .send_message(&*self.http, CreateMessage::new().embed(notice_embed(notice)))
            .await
            .map_err(classify)?;

        Ok(message.id.get())
    }

    async fn suspend_user(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), GatewayError> {
        let until = Timestamp::from_unix_timestamp(
            chrono::Utc::now().timestamp() + duration.as_secs() as i64,
        )
        .map_err(|e| GatewayError::Other(format!("Invalid timeout timestamp: {e}")))?;

        GuildId::new(guild_id)
            .edit_member(
                &*self.http,
                UserId::new(user_id),
                EditMember::new()
                    .disable_communication_until_datetime(until)
                    .audit_log_reason(reason),
            )
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn fetch_recent_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<RecentMessage>, GatewayError> {
        let messages = ChannelId::new(channel_id)
            .messages(&*self.http, GetMessages::new().limit(limit))
            .await
            .map_err(classify)?;

        Ok(messages
            .into_iter()
            .map(|m| RecentMessage {
                message_id: m.id.get(),
                author_id: m.author.id.get(),
                author_is_bot: m.author.bot || m.webhook_id.is_some(),
                is_pinned: m.pinned,
            })
            .collect())
    }
}

#[async_trait]
impl StatsChannelEditor for SerenityGateway {
    async fn rename_channel(&self, channel_id: u64, name: &str) -> Result<(), GatewayError> {
        ChannelId::new(channel_id)
            .edit(&*self.http, EditChannel::new().name(name))
            .await
            .map(|_| ())
            .map_err(classify)
    }
}
