// Welcome service - builds welcome/leave card posts.
//
// Image rendering is someone else's job: we only hand the compositor a user
// and a template, and fall back to a plain embed when it can't deliver.

use super::welcome_models::{CardPost, CardRequest, CardTemplate, MemberEvent};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use thiserror::Error;

const WELCOME_COLOUR: u32 = 0x3498DB;
const LEAVE_COLOUR: u32 = 0x95A5A6;

const TAGLINES: &[&str] = &[
    "Respect. Play. Repeat.",
    "GG only.",
    "Touch grass between matches.",
    "No campers were harmed in the making of this server.",
];

#[derive(Debug, Error)]
pub enum WelcomeError {
    #[error("Image render failed: {0}")]
    Render(String),

    #[error("Compositor request failed: {0}")]
    Http(String),
}

/// Port for the external image compositing service.
#[async_trait]
pub trait ImageCompositor: Send + Sync {
    /// Returns the rendered PNG bytes.
    async fn render(&self, request: &CardRequest) -> Result<Vec<u8>, WelcomeError>;
}

pub struct WelcomeService<C: ImageCompositor> {
    compositor: Option<C>,
    welcome_channel: Option<u64>,
    leave_channel: Option<u64>,
    community_name: String,
}

impl<C: ImageCompositor> WelcomeService<C> {
    pub fn new(
        compositor: Option<C>,
        welcome_channel: Option<u64>,
        leave_channel: Option<u64>,
        community_name: impl Into<String>,
    ) -> Self {
        Self {
            compositor,
            welcome_channel,
            // Leavers are announced where joiners are, unless told otherwise
            leave_channel: leave_channel.or(welcome_channel),
            community_name: community_name.into(),
        }
    }

    /// Build the welcome post for a new member. `None` for bots or when no
    /// welcome channel is configured.
    pub async fn welcome_card(&self, member: &MemberEvent) -> Option<CardPost> {
        let channel_id = self.welcome_channel?;
        self.card_in(channel_id, member, CardTemplate::Welcome).await
    }

    pub async fn leave_card(&self, member: &MemberEvent) -> Option<CardPost> {
        let channel_id = self.leave_channel?;
        self.card_in(channel_id, member, CardTemplate::Leave).await
    }

    /// Render a card into an explicit channel (used by `/testwelcome`).
    pub async fn card_in(
        &self,
        channel_id: u64,
        member: &MemberEvent,
        template: CardTemplate,
    ) -> Option<CardPost> {
        if member.is_bot {
            return None;
        }

        let image = self.render(member, template).await;
        let tagline = TAGLINES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or("");
        let footer = format!("{} • {}", self.community_name, tagline);

        let post = match template {
            CardTemplate::Welcome => {
                let mut fields = Vec::new();
                if let Some(joined_at) = member.joined_at {
                    fields.push(("📅 Joined".to_string(), format!("<t:{joined_at}:R>"), true));
                }
                fields.push((
                    "🔢 You are member".to_string(),
                    member.member_count.to_string(),
                    true,
                ));

                CardPost {
                    channel_id,
                    mention: Some(format!("<@{}>", member.user_id)),
                    title: format!(
                        "👋 Welcome to {}, {}!",
                        self.community_name, member.display_name
                    ),
                    description: "🎮 You're now part of the squad! Make sure to check the rules and roles."
                        .to_string(),
                    colour: WELCOME_COLOUR,
                    footer,
                    fields,
                    image,
                    image_name: template.file_name(),
                }
            }
            CardTemplate::Leave => CardPost {
                channel_id,
                mention: None,
                title: format!("👋 {} has left {}", member.display_name, self.community_name),
                description: "Thanks for playing with us. The lobby is always open.".to_string(),
                colour: LEAVE_COLOUR,
                footer,
                fields: vec![(
                    "👥 Members now".to_string(),
                    member.member_count.to_string(),
                    true,
                )],
                image,
                image_name: template.file_name(),
            },
        };

        Some(post)
    }

    async fn render(&self, member: &MemberEvent, template: CardTemplate) -> Option<Vec<u8>> {
        let compositor = self.compositor.as_ref()?;
        let request = CardRequest {
            user_id: member.user_id,
            display_name: member.display_name.clone(),
            avatar_url: member.avatar_url.clone(),
            template,
        };

        match compositor.render(&request).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(
                    user_id = member.user_id,
                    guild_id = member.guild_id,
                    "Falling back to text-only card: {}",
                    e
                );
                None
            }
        }
    }
}
