use serde::Serialize;

/// Which background the compositor should render onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardTemplate {
    Welcome,
    Leave,
}

impl CardTemplate {
    pub fn file_name(&self) -> &'static str {
        match self {
            CardTemplate::Welcome => "welcome.png",
            CardTemplate::Leave => "goodbye.png",
        }
    }
}

/// What we send to the image compositing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRequest {
    pub user_id: u64,
    pub display_name: String,
    pub avatar_url: String,
    pub template: CardTemplate,
}

/// A member joining or leaving, stripped of Discord types.
#[derive(Debug, Clone)]
pub struct MemberEvent {
    pub guild_id: u64,
    pub user_id: u64,
    pub display_name: String,
    pub avatar_url: String,
    pub is_bot: bool,
    /// Unix seconds; `None` when the platform didn't tell us
    pub joined_at: Option<i64>,
    pub member_count: u64,
}

/// A ready-to-send card post. The Discord layer turns this into an embed.
#[derive(Debug, Clone)]
pub struct CardPost {
    pub channel_id: u64,
    pub mention: Option<String>,
    pub title: String,
    pub description: String,
    pub colour: u32,
    pub footer: String,
    pub fields: Vec<(String, String, bool)>,
    pub image: Option<Vec<u8>>,
    pub image_name: &'static str,
}
