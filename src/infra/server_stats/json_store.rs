use crate::core::server_stats::{StatsChannels, StatsConfigStore, StatsError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// Stats channel ids in a small JSON file, keyed by guild id.
///
/// The whole map is rewritten on every change; it holds one entry per guild.
pub struct JsonStatsStore {
    path: PathBuf,
    configs: RwLock<HashMap<u64, StatsChannels>>,
}

impl JsonStatsStore {
    /// Load `path` if it exists. A missing file is an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StatsError> {
        let path = path.into();
        let configs = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| StatsError::Storage(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StatsError::Storage(e.to_string())),
        };

        Ok(Self {
            path,
            configs: RwLock::new(configs),
        })
    }

    async fn persist(&self, configs: &HashMap<u64, StatsChannels>) -> Result<(), StatsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StatsError::Storage(e.to_string()))?;
        }

        let json =
            serde_json::to_vec_pretty(configs).map_err(|e| StatsError::Storage(e.to_string()))?;

        // Write then rename, so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StatsError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StatsError::Storage(e.to_string()))
    }
}

#[async_trait]
impl StatsConfigStore for JsonStatsStore {
    async fn get(&self, guild_id: u64) -> Result<Option<StatsChannels>, StatsError> {
        Ok(self.configs.read().await.get(&guild_id).cloned())
    }

    async fn all(&self) -> Result<Vec<StatsChannels>, StatsError> {
        Ok(self.configs.read().await.values().cloned().collect())
    }

    async fn save(&self, channels: StatsChannels) -> Result<(), StatsError> {
        // Held across the write so concurrent saves land in order
        let mut configs = self.configs.write().await;
        configs.insert(channels.guild_id, channels);
        self.persist(&configs).await
    }

    async fn remove(&self, guild_id: u64) -> Result<Option<StatsChannels>, StatsError> {
        let mut configs = self.configs.write().await;
        let removed = configs.remove(&guild_id);
        if removed.is_some() {
            self.persist(&configs).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(guild_id: u64) -> StatsChannels {
        StatsChannels {
            guild_id,
            category_id: 10,
            total_members_channel_id: 11,
            humans_channel_id: 12,
            bots_channel_id: 13,
            boosts_channel_id: 14,
        }
    }

    #[tokio::test]
    async fn saved_channels_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("server_stats.json");

        let store = JsonStatsStore::open(&path).await.unwrap();
        assert!(store.all().await.unwrap().is_empty());
        store.save(channels(1)).await.unwrap();
        store.save(channels(2)).await.unwrap();
        assert_eq!(store.remove(2).await.unwrap(), Some(channels(2)));

        let reopened = JsonStatsStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(1).await.unwrap(), Some(channels(1)));
        assert_eq!(reopened.get(2).await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server_stats.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        assert!(matches!(
            JsonStatsStore::open(&path).await,
            Err(StatsError::Storage(_))
        ));
    }
}
