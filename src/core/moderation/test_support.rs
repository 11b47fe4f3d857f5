// In-memory chat gateway for moderation tests.

use super::chat_gateway::{ChatGateway, GatewayError};
use super::moderation_models::{InboundMessage, Notice, RecentMessage};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const GUILD_ID: u64 = 1;
pub const CHANNEL_ID: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct Suspension {
    pub guild_id: u64,
    pub user_id: u64,
    pub duration: Duration,
    pub reason: String,
}

/// Records every call. Deletions of unknown-but-already-deleted ids report
/// `NotFound`, like the real platform.
pub struct RecordingGateway {
    recent: Mutex<Vec<RecentMessage>>,
    deleted: Mutex<Vec<u64>>,
    bulk_deletes: Mutex<Vec<Vec<u64>>>,
    sent: Mutex<Vec<(u64, Notice)>>,
    sent_ids: Mutex<Vec<u64>>,
    suspensions: Mutex<Vec<Suspension>>,
    fetch_delay: Mutex<Option<Duration>>,
    fail_bulk_delete: AtomicBool,
    fail_fetch: AtomicBool,
    fail_suspend: AtomicBool,
    fail_send: AtomicBool,
    next_message_id: AtomicU64,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            recent: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            bulk_deletes: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            sent_ids: Mutex::new(Vec::new()),
            suspensions: Mutex::new(Vec::new()),
            fetch_delay: Mutex::new(None),
            fail_bulk_delete: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            fail_suspend: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            next_message_id: AtomicU64::new(900_000),
        }
    }

    pub fn set_recent(&self, messages: Vec<RecentMessage>) {
        *self.recent.lock().unwrap() = messages;
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = Some(delay);
    }

    pub fn mark_deleted(&self, message_id: u64) {
        self.deleted.lock().unwrap().push(message_id);
    }

    pub fn fail_bulk_delete(&self, fail: bool) {
        self.fail_bulk_delete.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fetch(&self, fail: bool) {
        self.fail_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn fail_suspend(&self, fail: bool) {
        self.fail_suspend.store(fail, Ordering::SeqCst);
    }

    pub fn fail_send(&self, fail: bool) {
        self.fail_send.store(fail, Ordering::SeqCst);
    }

    pub fn deleted(&self) -> Vec<u64> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn bulk_deletes(&self) -> Vec<Vec<u64>> {
        self.bulk_deletes.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(u64, Notice)> {
        self.sent.lock().unwrap().clone()
    }

    /// Ids handed out by `send_message`, in send order.
    pub fn sent_ids(&self) -> Vec<u64> {
        self.sent_ids.lock().unwrap().clone()
    }

    /// Every suspension attempt, successful or not.
    pub fn suspensions(&self) -> Vec<Suspension> {
        self.suspensions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn delete_message(&self, _channel_id: u64, message_id: u64) -> Result<(), GatewayError> {
        let mut deleted = self.deleted.lock().unwrap();
        if deleted.contains(&message_id) {
            return Err(GatewayError::NotFound);
        }
        deleted.push(message_id);
        Ok(())
    }

    async fn bulk_delete_messages(
        &self,
        _channel_id: u64,
        message_ids: &[u64],
    ) -> Result<usize, GatewayError> {
        if self.fail_bulk_delete.load(Ordering::SeqCst) {
            return Err(GatewayError::Other("messages older than 14 days".into()));
        }
        self.bulk_deletes.lock().unwrap().push(message_ids.to_vec());
        self.deleted.lock().unwrap().extend_from_slice(message_ids);
        Ok(message_ids.len())
    }

    async fn send_message(&self, channel_id: u64, notice: &Notice) -> Result<u64, GatewayError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(GatewayError::Forbidden);
        }
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push((channel_id, notice.clone()));
        self.sent_ids.lock().unwrap().push(id);
        Ok(id)
    }

    async fn suspend_user(
        &self,
        guild_id: u64,
        user_id: u64,
        duration: Duration,
        reason: &str,
    ) -> Result<(), GatewayError> {
        self.suspensions.lock().unwrap().push(Suspension {
            guild_id,
            user_id,
            duration,
            reason: reason.to_string(),
        });
        if self.fail_suspend.load(Ordering::SeqCst) {
            return Err(GatewayError::Forbidden);
        }
        Ok(())
    }

    async fn fetch_recent_messages(
        &self,
        _channel_id: u64,
        limit: u8,
    ) -> Result<Vec<RecentMessage>, GatewayError> {
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::Other("history unavailable".into()));
        }
        let recent = self.recent.lock().unwrap();
        Ok(recent.iter().take(limit as usize).cloned().collect())
    }
}

pub fn recent(message_id: u64, author_id: u64, author_is_bot: bool, is_pinned: bool) -> RecentMessage {
    RecentMessage {
        message_id,
        author_id,
        author_is_bot,
        is_pinned,
    }
}

pub fn inbound(author_id: u64, message_id: u64, content: &str) -> InboundMessage {
    inbound_at(author_id, message_id, content, Instant::now())
}

pub fn inbound_at(author_id: u64, message_id: u64, content: &str, at: Instant) -> InboundMessage {
    InboundMessage {
        guild_id: GUILD_ID,
        channel_id: CHANNEL_ID,
        message_id,
        author_id,
        content: content.to_string(),
        author_is_automated: false,
        author_is_privileged: false,
        received_at: at,
    }
}
