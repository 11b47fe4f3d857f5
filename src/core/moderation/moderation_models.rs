// Moderation domain models - data structures for the moderation engine.
//
// These are pure domain types with no Discord dependencies.
// The infra layer converts notices into embeds.

use std::time::{Duration, Instant};

/// A violation signal produced by one of the three checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Nothing to act on
    None,
    /// User sent too many messages too quickly
    Spam,
    /// Message contains a server invite link
    Invite,
    /// Message contains a disallowed keyword or links to a disallowed domain
    DisallowedContent { reason: String },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::None => write!(f, "None"),
            Violation::Spam => write!(f, "Spam"),
            Violation::Invite => write!(f, "Invite Link"),
            Violation::DisallowedContent { reason } => write!(f, "Disallowed Content ({reason})"),
        }
    }
}

/// One inbound chat message, already stripped of platform types.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub author_id: u64,
    pub content: String,
    /// Author is a bot or webhook
    pub author_is_automated: bool,
    /// Author has administrator or manage-messages capability
    pub author_is_privileged: bool,
    pub received_at: Instant,
}

/// Minimal view of a channel message used when collecting spam for cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentMessage {
    pub message_id: u64,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub is_pinned: bool,
}

/// A field inside a notice: (name, value, inline).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Platform-neutral description of a warning or log post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub fields: Vec<NoticeField>,
}

impl Notice {
    pub fn new(title: impl Into<String>, description: impl Into<String>, colour: u32) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            colour,
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(NoticeField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }
}

// Embed colours, matching Discord's named palette
pub const COLOUR_ORANGE: u32 = 0xE67E22;
pub const COLOUR_RED: u32 = 0xE74C3C;
pub const COLOUR_DARK_RED: u32 = 0x992D22;

/// How each violation class is punished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscalationPolicy {
    /// How long the warning notice stays up before it deletes itself
    pub notice_lifetime: Duration,
    /// Suspension length once escalation triggers
    pub suspension: Duration,
}

pub const SPAM_POLICY: EscalationPolicy = EscalationPolicy {
    notice_lifetime: Duration::from_secs(15),
    suspension: Duration::from_secs(10 * 60),
};

pub const DISALLOWED_CONTENT_POLICY: EscalationPolicy = EscalationPolicy {
    notice_lifetime: Duration::from_secs(20),
    suspension: Duration::from_secs(30 * 60),
};

pub const INVITE_POLICY: EscalationPolicy = EscalationPolicy {
    notice_lifetime: Duration::from_secs(15),
    suspension: Duration::from_secs(60 * 60),
};

/// Suspension notices posted outside a mod-log channel clean themselves up.
pub const SUSPENSION_NOTICE_LIFETIME: Duration = Duration::from_secs(30);

/// Outcome of bumping a user's warning counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarningOutcome {
    /// Count to display, before any reset
    pub warning_count: u32,
    /// Counter hit the limit and was reset; a suspension must be issued
    pub escalate: bool,
}
