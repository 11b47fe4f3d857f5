// Remediation actions - what happens once a violation is confirmed.
//
// Every platform call here is best effort. A failed delete or send is logged
// and the remaining steps still run; nothing in this file returns an error.

use super::chat_gateway::{ChatGateway, GatewayError};
use super::moderation_models::{
    EscalationPolicy, InboundMessage, Notice, Violation, WarningOutcome, COLOUR_DARK_RED,
    COLOUR_ORANGE, COLOUR_RED, DISALLOWED_CONTENT_POLICY, INVITE_POLICY, SPAM_POLICY,
    SUSPENSION_NOTICE_LIFETIME,
};
use super::moderation_state::ModerationState;
use std::sync::Arc;
use std::time::Duration;

/// How far back we look in the channel when collecting spam.
pub const SPAM_SCAN_LIMIT: u8 = 50;
/// Upper bound on messages removed per spam remediation.
pub const SPAM_CLEANUP_LIMIT: usize = 10;

/// What a single remediation did. Mostly useful for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationReport {
    pub violation: Violation,
    pub messages_deleted: usize,
    pub warning: Option<WarningOutcome>,
    pub notice_id: Option<u64>,
    pub suspension_scheduled: bool,
}

pub struct Remediator<G: ChatGateway> {
    gateway: Arc<G>,
    state: Arc<ModerationState>,
    mod_log_channel: Option<u64>,
}

impl<G: ChatGateway> Clone for Remediator<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            mod_log_channel: self.mod_log_channel,
        }
    }
}

impl<G: ChatGateway> Remediator<G> {
    pub fn new(gateway: Arc<G>, state: Arc<ModerationState>, mod_log_channel: Option<u64>) -> Self {
        Self {
            gateway,
            state,
            mod_log_channel,
        }
    }

    // ------------------------------------------------------------------------
    // Escalation tracks
    // ------------------------------------------------------------------------

    /// Sweep the user's recent messages, warn, and suspend on the last warning.
    pub async fn handle_spam(&self, msg: &InboundMessage) -> RemediationReport {
        let candidates = self.collect_spam_candidates(msg).await;
        let messages_deleted = self.purge(msg.channel_id, &candidates).await;

        tracing::info!(
            user_id = msg.author_id,
            channel_id = msg.channel_id,
            deleted = messages_deleted,
            "Deleted spam messages"
        );

        let max_warnings = self.state.config.max_warnings();
        let warning = self.state.tracker.add_warning(msg.author_id, max_warnings).await;

        let notice = Notice::new(
            "⚠️ Spam Detected",
            format!("<@{}> has been detected spamming!", msg.author_id),
            COLOUR_ORANGE,
        )
        .field("Warning", format!("{}/{}", warning.warning_count, max_warnings), true)
        .field("Action", format!("Deleted {messages_deleted} messages"), true)
        .field("Reason", "Sending messages too quickly", false);

        self.finish(
            msg,
            Violation::Spam,
            SPAM_POLICY,
            notice,
            messages_deleted,
            Some(warning),
            "Excessive spam",
        )
        .await
    }

    /// Delete the message and suspend, every time.
    pub async fn handle_disallowed_content(
        &self,
        msg: &InboundMessage,
        reason: &str,
    ) -> RemediationReport {
        let messages_deleted = usize::from(self.delete_one(msg.channel_id, msg.message_id).await);

        let notice = Notice::new(
            "🔞 Disallowed Content Detected",
            format!("<@{}> sent inappropriate content!", msg.author_id),
            COLOUR_RED,
        )
        .field("Reason", reason, false)
        .field(
            "Action",
            format!(
                "Message deleted + {}min timeout",
                DISALLOWED_CONTENT_POLICY.suspension.as_secs() / 60
            ),
            true,
        );

        let violation = Violation::DisallowedContent {
            reason: reason.to_string(),
        };
        let suspension_reason = format!("Disallowed content: {reason}");

        self.finish(
            msg,
            violation,
            DISALLOWED_CONTENT_POLICY,
            notice,
            messages_deleted,
            None,
            &suspension_reason,
        )
        .await
    }

    /// Delete the message, warn, and suspend on the last warning.
    pub async fn handle_invite(&self, msg: &InboundMessage) -> RemediationReport {
        let messages_deleted = usize::from(self.delete_one(msg.channel_id, msg.message_id).await);

        let max_warnings = self.state.config.max_warnings();
        let warning = self.state.tracker.add_warning(msg.author_id, max_warnings).await;

        let notice = Notice::new(
            "🚫 Invite Link Detected",
            format!("<@{}> sent a server invite link!", msg.author_id),
            COLOUR_RED,
        )
        .field("Warning", format!("{}/{}", warning.warning_count, max_warnings), true)
        .field("Action", "Message deleted", true);

        self.finish(
            msg,
            Violation::Invite,
            INVITE_POLICY,
            notice,
            messages_deleted,
            Some(warning),
            "Excessive invite link spam",
        )
        .await
    }

    /// Shared tail: post the protected notice, then schedule a suspension when
    /// the track calls for one. `warning == None` means "always suspend".
    #[allow(clippy::too_many_arguments)]
    async fn finish(
        &self,
        msg: &InboundMessage,
        violation: Violation,
        policy: EscalationPolicy,
        notice: Notice,
        messages_deleted: usize,
        warning: Option<WarningOutcome>,
        suspension_reason: &str,
    ) -> RemediationReport {
        let notice_id = self
            .post_protected_notice(msg.channel_id, &notice, policy.notice_lifetime)
            .await;

        let suspension_scheduled = warning.map_or(true, |w| w.escalate);
        if suspension_scheduled {
            self.schedule_suspension(msg, policy.suspension, suspension_reason.to_string());
        }

        tracing::info!(
            user_id = msg.author_id,
            violation = %violation,
            warnings = warning.map(|w| w.warning_count),
            suspension_scheduled,
            "Remediation complete"
        );

        RemediationReport {
            violation,
            messages_deleted,
            warning,
            notice_id,
            suspension_scheduled,
        }
    }

    // ------------------------------------------------------------------------
    // Message cleanup
    // ------------------------------------------------------------------------

    /// The user's most recent messages, skipping bots, pinned messages and our
    /// own protected notices.
    pub async fn collect_spam_candidates(&self, msg: &InboundMessage) -> Vec<u64> {
        let coordinator = &self.state.coordinator;

        match self
            .gateway
            .fetch_recent_messages(msg.channel_id, SPAM_SCAN_LIMIT)
            .await
        {
            Ok(history) => history
                .into_iter()
                .filter(|m| {
                    m.author_id == msg.author_id
                        && !m.author_is_bot
                        && !m.is_pinned
                        && !coordinator.is_protected(m.message_id)
                })
                .map(|m| m.message_id)
                .take(SPAM_CLEANUP_LIMIT)
                .collect(),
            Err(e) => {
                tracing::warn!(
                    channel_id = msg.channel_id,
                    "Failed to fetch channel history, deleting only the triggering message: {}",
                    e
                );
                vec![msg.message_id]
            }
        }
    }

    /// Delete `message_ids` with the bulk endpoint, falling back to one-by-one
    /// deletion if that fails. Returns how many messages were removed.
    ///
    /// Callers filter the candidates first; nothing is re-checked here.
    pub async fn purge(&self, channel_id: u64, message_ids: &[u64]) -> usize {
        match message_ids {
            [] => 0,
            // The platform rejects bulk deletes of a single message
            [only] => usize::from(self.delete_one(channel_id, *only).await),
            _ => match self.gateway.bulk_delete_messages(channel_id, message_ids).await {
                Ok(count) => count,
                Err(e) => {
                    tracing::warn!(
                        channel_id,
                        count = message_ids.len(),
                        "Bulk delete failed, deleting individually: {}",
                        e
                    );
                    let mut deleted = 0;
                    for id in message_ids {
                        if self.delete_one(channel_id, *id).await {
                            deleted += 1;
                        }
                    }
                    deleted
                }
            },
        }
    }

    /// Returns true only when the message was actually removed.
    async fn delete_one(&self, channel_id: u64, message_id: u64) -> bool {
        match self.gateway.delete_message(channel_id, message_id).await {
            Ok(()) => true,
            Err(e) if e.is_benign() => {
                tracing::debug!(channel_id, message_id, "Skipped delete: {}", e);
                false
            }
            Err(e) => {
                tracing::warn!(channel_id, message_id, "Failed to delete message: {}", e);
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Notices and suspension (fire-and-forget)
    // ------------------------------------------------------------------------

    /// Send a notice, shield it from spam sweeps, and delete it after `lifetime`.
    async fn post_protected_notice(
        &self,
        channel_id: u64,
        notice: &Notice,
        lifetime: Duration,
    ) -> Option<u64> {
        match self.gateway.send_message(channel_id, notice).await {
            Ok(message_id) => {
                self.state.coordinator.protect_message(message_id);
                self.schedule_notice_cleanup(channel_id, message_id, lifetime);
                Some(message_id)
            }
            Err(e) => {
                tracing::warn!(channel_id, "Failed to send moderation notice: {}", e);
                None
            }
        }
    }

    fn schedule_notice_cleanup(&self, channel_id: u64, message_id: u64, delay: Duration) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            this.delete_one(channel_id, message_id).await;
            this.state.coordinator.release_message(message_id);
            tracing::debug!(channel_id, message_id, "Moderation notice cleaned up");
        });
    }

    fn schedule_suspension(&self, msg: &InboundMessage, duration: Duration, reason: String) {
        let this = self.clone();
        let guild_id = msg.guild_id;
        let user_id = msg.author_id;
        let channel_id = msg.channel_id;

        tokio::spawn(async move {
            match this.gateway.suspend_user(guild_id, user_id, duration, &reason).await {
                Ok(()) => {
                    tracing::info!(
                        user_id,
                        guild_id,
                        minutes = duration.as_secs() / 60,
                        reason = %reason,
                        "User timed out"
                    );
                    this.announce_suspension(channel_id, user_id, duration, &reason).await;
                }
                Err(GatewayError::Forbidden) => {
                    tracing::error!(user_id, guild_id, "Missing permissions to timeout users");
                }
                Err(e) => {
                    tracing::error!(user_id, guild_id, "Error timing out user: {}", e);
                }
            }
        });
    }

    /// Mod-log notices stay; notices in the offending channel clean themselves up.
    async fn announce_suspension(
        &self,
        channel_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) {
        let notice = Notice::new(
            "⏰ User Timed Out",
            format!("<@{user_id}> has been timed out"),
            COLOUR_DARK_RED,
        )
        .field("Duration", format!("{} minutes", duration.as_secs() / 60), true)
        .field("Reason", reason, true);

        match self.mod_log_channel {
            Some(log_channel) => {
                if let Err(e) = self.gateway.send_message(log_channel, &notice).await {
                    tracing::warn!(channel_id = log_channel, "Failed to post timeout to mod log: {}", e);
                }
            }
            None => {
                self.post_protected_notice(channel_id, &notice, SUSPENSION_NOTICE_LIFETIME)
                    .await;
            }
        }
    }
}
