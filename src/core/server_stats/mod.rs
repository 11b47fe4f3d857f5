pub mod server_stats_models;
pub mod server_stats_service;

pub use server_stats_models::{GuildCounts, StatKind, StatsChannels};
pub use server_stats_service::{ServerStatsService, StatsChannelEditor, StatsConfigStore, StatsError};
