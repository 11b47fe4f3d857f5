// Discord layer - commands and event handlers.

#[path = "commands/command_catalog.rs"]
pub mod commands;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "server_stats/mod.rs"]
pub mod server_stats;

#[path = "welcome/mod.rs"]
pub mod welcome;

use crate::core::moderation::ModerationService;
use crate::core::server_stats::ServerStatsService;
use crate::core::welcome::WelcomeService;
use crate::infra::moderation::SerenityGateway;
use crate::infra::server_stats::JsonStatsStore;
use crate::infra::welcome::HttpImageCompositor;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

pub type StatsService = ServerStatsService<JsonStatsStore, SerenityGateway>;

/// Data that's shared across all commands and event handlers.
pub struct Data {
    pub moderation: ModerationService<SerenityGateway>,
    pub welcome: Arc<WelcomeService<HttpImageCompositor>>,
    pub server_stats: Arc<StatsService>,
}

/// Every slash command the bot registers.
pub fn all_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        moderation::commands::modconfig(),
        moderation::commands::clearwarnings(),
        moderation::commands::clear(),
        moderation::commands::timeout(),
        commands::announce::announce(),
        welcome::commands::testwelcome(),
        server_stats::commands::serverstats(),
    ]
}
