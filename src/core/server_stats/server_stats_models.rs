use serde::{Deserialize, Serialize};

/// Member numbers for one guild at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildCounts {
    pub total_members: u64,
    pub bots: u64,
    pub boosts: u64,
}

impl GuildCounts {
    pub fn humans(&self) -> u64 {
        self.total_members.saturating_sub(self.bots)
    }

    pub fn get(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::TotalMembers => self.total_members,
            StatKind::Humans => self.humans(),
            StatKind::Bots => self.bots,
            StatKind::Boosts => self.boosts,
        }
    }
}

/// One counter shown as a locked voice channel name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatKind {
    TotalMembers,
    Humans,
    Bots,
    Boosts,
}

impl StatKind {
    pub const ALL: [StatKind; 4] = [
        StatKind::TotalMembers,
        StatKind::Humans,
        StatKind::Bots,
        StatKind::Boosts,
    ];

    pub fn label(&self, count: u64) -> String {
        match self {
            StatKind::TotalMembers => format!("👥 All Members: {count}"),
            StatKind::Humans => format!("🧑 Humans: {count}"),
            StatKind::Bots => format!("🤖 Bots: {count}"),
            StatKind::Boosts => format!("🚀 Boosts: {count}"),
        }
    }
}

/// The category and counter channels created for a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsChannels {
    pub guild_id: u64,
    pub category_id: u64,
    pub total_members_channel_id: u64,
    pub humans_channel_id: u64,
    pub bots_channel_id: u64,
    pub boosts_channel_id: u64,
}

impl StatsChannels {
    pub fn channel_for(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::TotalMembers => self.total_members_channel_id,
            StatKind::Humans => self.humans_channel_id,
            StatKind::Bots => self.bots_channel_id,
            StatKind::Boosts => self.boosts_channel_id,
        }
    }

    /// `(channel_id, name)` for every counter channel.
    pub fn channel_names(&self, counts: &GuildCounts) -> Vec<(u64, String)> {
        StatKind::ALL
            .iter()
            .map(|kind| (self.channel_for(*kind), kind.label(counts.get(*kind))))
            .collect()
    }

    /// Counter channels first, category last, so children go before their parent.
    pub fn all_channel_ids(&self) -> [u64; 5] {
        [
            self.total_members_channel_id,
            self.humans_channel_id,
            self.bots_channel_id,
            self.boosts_channel_id,
            self.category_id,
        ]
    }
}
