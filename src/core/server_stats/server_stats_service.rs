// Server stats service - keeps counter channel names in step with the guild.
//
// Discord allows only two renames per channel every ten minutes, so member
// events just mark a guild dirty. A periodic flush recomputes the names and
// renames only the channels whose text actually changed.

use super::server_stats_models::{GuildCounts, StatsChannels};
use crate::core::moderation::GatewayError;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Already configured")]
    AlreadyConfigured,
    #[error("Not configured")]
    NotConfigured,
}

/// Where per-guild stats channel ids are kept between restarts.
#[async_trait]
pub trait StatsConfigStore: Send + Sync {
    async fn get(&self, guild_id: u64) -> Result<Option<StatsChannels>, StatsError>;
    async fn all(&self) -> Result<Vec<StatsChannels>, StatsError>;
    async fn save(&self, channels: StatsChannels) -> Result<(), StatsError>;
    async fn remove(&self, guild_id: u64) -> Result<Option<StatsChannels>, StatsError>;
}

#[async_trait]
pub trait StatsChannelEditor: Send + Sync {
    async fn rename_channel(&self, channel_id: u64, name: &str) -> Result<(), GatewayError>;
}

pub struct ServerStatsService<S: StatsConfigStore, E: StatsChannelEditor> {
    store: S,
    editor: E,
    /// Last name successfully written, per channel
    published: DashMap<u64, String>,
    dirty: DashSet<u64>,
}

impl<S: StatsConfigStore, E: StatsChannelEditor> ServerStatsService<S, E> {
    pub fn new(store: S, editor: E) -> Self {
        Self {
            store,
            editor,
            published: DashMap::new(),
            dirty: DashSet::new(),
        }
    }

    pub async fn config(&self, guild_id: u64) -> Result<Option<StatsChannels>, StatsError> {
        self.store.get(guild_id).await
    }

    /// Save freshly created channels. `counts` are the numbers their names
    /// were created with.
    pub async fn register(
        &self,
        channels: StatsChannels,
        counts: &GuildCounts,
    ) -> Result<(), StatsError> {
        if self.store.get(channels.guild_id).await?.is_some() {
            return Err(StatsError::AlreadyConfigured);
        }

        for (channel_id, name) in channels.channel_names(counts) {
            self.published.insert(channel_id, name);
        }
        self.store.save(channels).await
    }

    /// Forget a guild's channels and hand them back so the caller can delete them.
    pub async fn unregister(&self, guild_id: u64) -> Result<StatsChannels, StatsError> {
        let channels = self
            .store
            .remove(guild_id)
            .await?
            .ok_or(StatsError::NotConfigured)?;

        for channel_id in channels.all_channel_ids() {
            self.published.remove(&channel_id);
        }
        self.dirty.remove(&guild_id);
        Ok(channels)
    }

    pub fn mark_dirty(&self, guild_id: u64) {
        self.dirty.insert(guild_id);
    }

    /// Mark every configured guild dirty (used at startup).
    pub async fn mark_all_dirty(&self) -> Result<usize, StatsError> {
        let configs = self.store.all().await?;
        for channels in &configs {
            self.dirty.insert(channels.guild_id);
        }
        Ok(configs.len())
    }

    /// Drain the set of guilds waiting for a refresh.
    pub fn take_dirty(&self) -> Vec<u64> {
        let guilds: Vec<u64> = self.dirty.iter().map(|g| *g).collect();
        for guild_id in &guilds {
            self.dirty.remove(guild_id);
        }
        guilds
    }

    /// Rename the counter channels whose text changed. Returns how many were
    /// renamed. Failed renames are logged and retried on the next refresh.
    pub async fn refresh(&self, guild_id: u64, counts: &GuildCounts) -> Result<usize, StatsError> {
        let Some(channels) = self.store.get(guild_id).await? else {
            return Ok(0);
        };

        let mut renamed = 0;
        for (channel_id, name) in channels.channel_names(counts) {
            let unchanged = self
                .published
                .get(&channel_id)
                .is_some_and(|current| *current == name);
            if unchanged {
                continue;
            }

            match self.editor.rename_channel(channel_id, &name).await {
                Ok(()) => {
                    self.published.insert(channel_id, name);
                    renamed += 1;
                }
                Err(e) => {
                    tracing::warn!(guild_id, channel_id, "Failed to update stats channel: {}", e);
                }
            }
        }

        if renamed > 0 {
            tracing::debug!(guild_id, renamed, "Server stats refreshed");
        }
        Ok(renamed)
    }
}
