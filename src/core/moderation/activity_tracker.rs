// User activity tracker - the authoritative per-user moderation state.
//
// Each user gets one record behind its own async mutex. The mutex is the
// user's exclusivity lock: the spam counter and the warning counter are only
// read or written while it is held.

use super::moderation_config::ModerationConfig;
use super::moderation_models::WarningOutcome;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Only the newest timestamps are kept for spam-rate computation.
pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Default)]
pub struct UserActivityRecord {
    recent_message_timestamps: VecDeque<Instant>,
    warning_count: u32,
}

impl UserActivityRecord {
    /// Append `now`, then report whether the user crossed the spam threshold.
    ///
    /// Only ten timestamps are kept, so thresholds above ten fire at the tenth
    /// message inside the window.
    pub fn record_and_check_spam(&mut self, now: Instant, threshold: u32, window: Duration) -> bool {
        self.recent_message_timestamps.push_back(now);
        while self.recent_message_timestamps.len() > HISTORY_CAPACITY {
            self.recent_message_timestamps.pop_front();
        }

        let in_window = self.messages_within(now, window);
        in_window >= (threshold as usize).min(HISTORY_CAPACITY)
    }

    pub fn messages_within(&self, now: Instant, window: Duration) -> usize {
        self.recent_message_timestamps
            .iter()
            .filter(|t| now.saturating_duration_since(**t) <= window)
            .count()
    }

    /// Bump the warning counter. Hitting `max_warnings` resets it to zero and
    /// reports that a suspension is due.
    pub fn add_warning(&mut self, max_warnings: u32) -> WarningOutcome {
        self.warning_count = self.warning_count.saturating_add(1);
        let warning_count = self.warning_count;

        let escalate = warning_count >= max_warnings;
        if escalate {
            self.warning_count = 0;
        }

        WarningOutcome {
            warning_count,
            escalate,
        }
    }

    pub fn reset_warnings(&mut self) {
        self.warning_count = 0;
    }

    pub fn warning_count(&self) -> u32 {
        self.warning_count
    }

    pub fn history_len(&self) -> usize {
        self.recent_message_timestamps.len()
    }

    pub fn last_activity(&self) -> Option<Instant> {
        self.recent_message_timestamps.back().copied()
    }
}

pub type UserSlot = Arc<Mutex<UserActivityRecord>>;

#[derive(Default)]
pub struct ActivityTracker {
    records: DashMap<u64, UserSlot>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and lock are created lazily on first use.
    fn slot(&self, user_id: u64) -> UserSlot {
        Arc::clone(self.records.entry(user_id).or_default().value())
    }

    /// Acquire the user's exclusivity lock.
    pub async fn lock(&self, user_id: u64) -> OwnedMutexGuard<UserActivityRecord> {
        self.slot(user_id).lock_owned().await
    }

    pub async fn record_and_check_spam(
        &self,
        user_id: u64,
        now: Instant,
        config: &ModerationConfig,
    ) -> bool {
        let mut record = self.lock(user_id).await;
        record.record_and_check_spam(now, config.spam_message_threshold(), config.spam_window())
    }

    pub async fn add_warning(&self, user_id: u64, max_warnings: u32) -> WarningOutcome {
        self.lock(user_id).await.add_warning(max_warnings)
    }

    pub async fn reset_warnings(&self, user_id: u64) {
        self.lock(user_id).await.reset_warnings();
    }

    pub async fn warning_count(&self, user_id: u64) -> u32 {
        self.lock(user_id).await.warning_count()
    }

    pub fn tracked_users(&self) -> usize {
        self.records.len()
    }

    /// Drop records idle for longer than `max_idle`. Records that are locked,
    /// referenced by an in-flight task, or still carry warnings are kept.
    pub fn evict_idle(&self, now: Instant, max_idle: Duration) -> usize {
        let before = self.records.len();

        self.records.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(record) => {
                    record.warning_count() > 0
                        || record
                            .last_activity()
                            .is_some_and(|last| now.saturating_duration_since(last) < max_idle)
                }
                Err(_) => true,
            }
        });

        before.saturating_sub(self.records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn fifth_message_in_window_is_spam() {
        let start = Instant::now();
        let mut record = UserActivityRecord::default();

        for i in 0..4 {
            assert!(!record.record_and_check_spam(start + secs(i), 5, secs(10)));
        }
        assert!(record.record_and_check_spam(start + secs(4), 5, secs(10)));
    }

    #[test]
    fn old_messages_fall_out_of_the_window() {
        let start = Instant::now();
        let mut record = UserActivityRecord::default();

        for i in 0..4 {
            record.record_and_check_spam(start + secs(i), 5, secs(10));
        }
        // 30 seconds later only this message is in the window
        assert!(!record.record_and_check_spam(start + secs(30), 5, secs(10)));
        assert_eq!(record.messages_within(start + secs(30), secs(10)), 1);
    }

    #[test]
    fn history_never_exceeds_capacity() {
        let start = Instant::now();
        let mut record = UserActivityRecord::default();

        for i in 0..25 {
            record.record_and_check_spam(start + Duration::from_millis(i * 10), 20, secs(60));
            assert!(record.history_len() <= HISTORY_CAPACITY);
        }
        assert_eq!(record.history_len(), HISTORY_CAPACITY);
    }

    #[test]
    fn thresholds_above_capacity_fire_at_capacity() {
        let start = Instant::now();
        let mut record = UserActivityRecord::default();

        for i in 0..9 {
            assert!(!record.record_and_check_spam(start + Duration::from_millis(i), 20, secs(60)));
        }
        assert!(record.record_and_check_spam(start + Duration::from_millis(9), 20, secs(60)));
    }

    #[test]
    fn warnings_escalate_and_reset_at_limit() {
        let mut record = UserActivityRecord::default();

        let counts: Vec<_> = (0..4).map(|_| record.add_warning(3)).collect();

        assert_eq!(
            counts,
            vec![
                WarningOutcome { warning_count: 1, escalate: false },
                WarningOutcome { warning_count: 2, escalate: false },
                WarningOutcome { warning_count: 3, escalate: true },
                WarningOutcome { warning_count: 1, escalate: false },
            ]
        );
    }

    #[tokio::test]
    async fn tracker_isolates_users() {
        let tracker = ActivityTracker::new();
        let config = ModerationConfig::default();
        let start = Instant::now();

        for i in 0..4 {
            tracker.record_and_check_spam(1, start + secs(i), &config).await;
        }
        assert!(!tracker.record_and_check_spam(2, start + secs(4), &config).await);
        assert!(tracker.record_and_check_spam(1, start + secs(4), &config).await);
        assert_eq!(tracker.tracked_users(), 2);
    }

    #[tokio::test]
    async fn reset_warnings_clears_counter() {
        let tracker = ActivityTracker::new();

        tracker.add_warning(7, 3).await;
        tracker.add_warning(7, 3).await;
        assert_eq!(tracker.warning_count(7).await, 2);

        tracker.reset_warnings(7).await;
        assert_eq!(tracker.warning_count(7).await, 0);
    }

    #[tokio::test]
    async fn eviction_skips_recent_and_locked_records() {
        let tracker = ActivityTracker::new();
        let config = ModerationConfig::default();
        let start = Instant::now();

        tracker.record_and_check_spam(1, start, &config).await;
        tracker.record_and_check_spam(2, start + secs(3000), &config).await;
        tracker.record_and_check_spam(3, start, &config).await;

        let held = tracker.lock(3).await;
        let evicted = tracker.evict_idle(start + secs(3600), secs(3600));
        drop(held);

        assert_eq!(evicted, 1);
        assert_eq!(tracker.tracked_users(), 2);
    }

    #[tokio::test]
    async fn eviction_keeps_users_with_pending_warnings() {
        let tracker = ActivityTracker::new();
        let config = ModerationConfig::default();
        let start = Instant::now();

        tracker.record_and_check_spam(1, start, &config).await;
        tracker.add_warning(1, 3).await;
        tracker.record_and_check_spam(2, start, &config).await;

        let evicted = tracker.evict_idle(start + secs(7200), secs(3600));

        assert_eq!(evicted, 1);
        assert_eq!(tracker.warning_count(1).await, 1);
    }
}
