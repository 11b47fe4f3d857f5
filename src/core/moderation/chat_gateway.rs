// Chat transport port - everything the moderation engine needs from the platform.
//
// The engine never talks to Discord directly. The infra layer implements this
// trait on top of serenity's HTTP client; tests implement it in memory.

use super::moderation_models::{Notice, RecentMessage};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    #[error("Message or member not found")]
    NotFound,

    #[error("Missing permissions")]
    Forbidden,

    #[error("Platform error: {0}")]
    Other(String),
}

impl GatewayError {
    /// "Already gone" and "not allowed" are expected during cleanup and are
    /// treated as no-ops by the remediation code.
    pub fn is_benign(&self) -> bool {
        matches!(self, GatewayError::NotFound | GatewayError::Forbidden)
    }
}

// ============================================================================
// GATEWAY TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ChatGateway: Send + Sync + 'static {
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError>;

    /// Delete several messages in one request. Returns how many were removed.
    async fn bulk_delete_messages(
        &self,
        channel_id: u64,
        message_ids: &[u64],
    ) -> Result<usize, GatewayError>;

    /// Post a notice and return the id of the created message.
    async fn send_message(&self, channel_id: u64, notice: &Notice) -> Result<u64, GatewayError>;

    async fn suspend_user(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), GatewayError>;

    /// Most recent messages first.
    async fn fetch_recent_messages(
        &self,
        channel_id: u64,
        limit: u8,
    ) -> Result<Vec<RecentMessage>, GatewayError>;
}
