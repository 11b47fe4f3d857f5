// Discord-specific glue - turns a gateway message into a moderation input.

use crate::core::moderation::InboundMessage;
use crate::discord::Data;
use poise::serenity_prelude as serenity;
use std::time::Instant;

/// Hand a guild message to the moderation engine. DMs are ignored.
///
/// Returns immediately; the checks run in the background.
pub fn moderate_message(ctx: &serenity::Context, data: &Data, msg: &serenity::Message) {
    let Some(guild_id) = msg.guild_id else {
        return;
    };

    let inbound = InboundMessage {
        guild_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        content: msg.content.clone(),
        author_is_automated: msg.author.bot || msg.webhook_id.is_some(),
        author_is_privileged: author_is_privileged(ctx, msg),
        received_at: Instant::now(),
    };

    data.moderation.on_message(inbound);
}

/// Administrators and anyone who can manage messages are exempt.
///
/// Permissions come from the member data attached to the message itself, with
/// channel overwrites applied, so authors missing from the member cache are
/// still recognised.
fn author_is_privileged(ctx: &serenity::Context, msg: &serenity::Message) -> bool {
    grants_exemption(msg.author_permissions(&ctx.cache))
}

/// `None` means the permissions couldn't be resolved; treat as a regular user.
fn grants_exemption(permissions: Option<serenity::Permissions>) -> bool {
    permissions.is_some_and(|p| p.administrator() || p.manage_messages())
}

#[cfg(test)]
mod tests {
    use super::*;
    use self::serenity::Permissions;

    #[test]
    fn administrators_and_message_managers_are_exempt() {
        assert!(grants_exemption(Some(Permissions::ADMINISTRATOR)));
        assert!(grants_exemption(Some(Permissions::MANAGE_MESSAGES)));
        assert!(grants_exemption(Some(
            Permissions::SEND_MESSAGES | Permissions::MANAGE_MESSAGES
        )));
    }

    #[test]
    fn regular_and_unresolved_authors_are_moderated() {
        assert!(!grants_exemption(Some(Permissions::SEND_MESSAGES)));
        assert!(!grants_exemption(Some(Permissions::MODERATE_MEMBERS)));
        assert!(!grants_exemption(None));
    }
}
