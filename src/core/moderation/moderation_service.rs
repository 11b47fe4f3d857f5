// Moderation service - the per-message entry point of the moderation engine.
//
// This service handles:
// - Filtering out automated and privileged authors
// - Running the spam, content and invite checks concurrently
// - Handing confirmed violations to the remediator
//
// NO Discord dependencies here - just pure domain logic.

use super::chat_gateway::ChatGateway;
use super::content_matcher::ContentMatcher;
use super::moderation_config::ModerationSettings;
use super::moderation_models::{InboundMessage, Violation};
use super::moderation_state::ModerationState;
use super::remediation::{RemediationReport, Remediator};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct ModerationService<G: ChatGateway> {
    state: Arc<ModerationState>,
    matcher: Arc<ContentMatcher>,
    remediator: Remediator<G>,
}

// Cheap handle: every field is shared, so spawned tasks can own a copy.
impl<G: ChatGateway> Clone for ModerationService<G> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            matcher: Arc::clone(&self.matcher),
            remediator: self.remediator.clone(),
        }
    }
}

impl<G: ChatGateway> ModerationService<G> {
    /// Create a new moderation service on top of the given gateway.
    pub fn new(gateway: Arc<G>, settings: ModerationSettings, mod_log_channel: Option<u64>) -> Self {
        Self::with_matcher(gateway, settings, mod_log_channel, ContentMatcher::new())
    }

    pub fn with_matcher(
        gateway: Arc<G>,
        settings: ModerationSettings,
        mod_log_channel: Option<u64>,
        matcher: ContentMatcher,
    ) -> Self {
        let state = Arc::new(ModerationState::new(settings));
        let remediator = Remediator::new(gateway, Arc::clone(&state), mod_log_channel);
        Self {
            state,
            matcher: Arc::new(matcher),
            remediator,
        }
    }

    pub fn state(&self) -> &ModerationState {
        &self.state
    }

    /// Automated and privileged authors are never moderated.
    pub fn should_moderate(msg: &InboundMessage) -> bool {
        !msg.author_is_automated && !msg.author_is_privileged
    }

    /// Fire-and-forget entry point for the gateway event loop.
    ///
    /// Returns as soon as the checks are launched. Returns `false` when the
    /// message was filtered out.
    pub fn on_message(&self, msg: InboundMessage) -> bool {
        if !Self::should_moderate(&msg) {
            return false;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.moderate(msg).await;
        });
        true
    }

    /// Run all three checks concurrently and wait for their remediations.
    ///
    /// Each check runs in its own task, so a panic in one never suppresses the
    /// others. Reports come back in spam, content, invite order.
    pub async fn moderate(&self, msg: InboundMessage) -> Vec<RemediationReport> {
        if !Self::should_moderate(&msg) {
            return Vec::new();
        }

        let msg = Arc::new(msg);

        let spam = {
            let this = self.clone();
            let msg = Arc::clone(&msg);
            tokio::spawn(async move { this.check_spam(&msg).await })
        };
        let content = {
            let this = self.clone();
            let msg = Arc::clone(&msg);
            tokio::spawn(async move { this.check_content(&msg).await })
        };
        let invite = {
            let this = self.clone();
            let msg = Arc::clone(&msg);
            tokio::spawn(async move { this.check_invite(&msg).await })
        };

        let (spam, content, invite) = tokio::join!(spam, content, invite);

        let mut reports = Vec::new();
        for (check, outcome) in [("spam", spam), ("content", content), ("invite", invite)] {
            match outcome {
                Ok(Some(report)) => reports.push(report),
                Ok(None) => {}
                Err(e) => tracing::error!(
                    check,
                    message_id = msg.message_id,
                    "Moderation check failed: {}",
                    e
                ),
            }
        }
        reports
    }

    // ------------------------------------------------------------------------
    // Individual checks
    // ------------------------------------------------------------------------

    /// Record the message and, if that crosses the threshold, remediate once.
    ///
    /// The timestamp append and threshold test happen under the user's lock,
    /// and the remediation slot is claimed before the lock is released. A
    /// user already being remediated for spam is skipped outright.
    async fn check_spam(&self, msg: &InboundMessage) -> Option<RemediationReport> {
        let user_id = msg.author_id;
        let coordinator = &self.state.coordinator;
        let config = &self.state.config;

        let _slot = {
            let mut record = self.state.tracker.lock(user_id).await;
            if coordinator.is_remediating(user_id) {
                return None;
            }
            if !record.record_and_check_spam(
                msg.received_at,
                config.spam_message_threshold(),
                config.spam_window(),
            ) {
                return None;
            }
            coordinator.try_enter_remediation(user_id)?
        };

        tracing::debug!(user_id, channel_id = msg.channel_id, "Spam threshold crossed");
        Some(self.remediator.handle_spam(msg).await)
    }

    /// Runs regardless of any spam remediation in progress for the same user.
    async fn check_content(&self, msg: &InboundMessage) -> Option<RemediationReport> {
        match self.matcher.classify_content(&msg.content) {
            Violation::DisallowedContent { reason } => Some(
                self.remediator
                    .handle_disallowed_content(msg, &reason)
                    .await,
            ),
            _ => None,
        }
    }

    async fn check_invite(&self, msg: &InboundMessage) -> Option<RemediationReport> {
        match self.matcher.classify_invite(&msg.content) {
            Violation::Invite => Some(self.remediator.handle_invite(msg).await),
            _ => None,
        }
    }

    // ------------------------------------------------------------------------
    // Admin operations
    // ------------------------------------------------------------------------

    pub fn settings(&self) -> ModerationSettings {
        self.state.config.snapshot()
    }

    /// Apply whichever values are given, clamped. Returns the effective settings.
    pub fn update_settings(
        &self,
        spam_message_threshold: Option<u32>,
        spam_window_secs: Option<u32>,
        max_warnings: Option<u32>,
    ) -> ModerationSettings {
        let config = &self.state.config;
        if let Some(v) = spam_message_threshold {
            config.set_spam_message_threshold(v);
        }
        if let Some(v) = spam_window_secs {
            config.set_spam_window_secs(v);
        }
        if let Some(v) = max_warnings {
            config.set_max_warnings(v);
        }
        config.snapshot()
    }

    pub async fn user_warnings(&self, user_id: u64) -> u32 {
        self.state.tracker.warning_count(user_id).await
    }

    /// Clear warnings for a user (admin action).
    pub async fn clear_user_warnings(&self, user_id: u64) {
        self.state.tracker.reset_warnings(user_id).await;
    }

    /// Forget users that have been quiet for `max_idle`.
    pub fn evict_idle_users(&self, max_idle: Duration) -> usize {
        self.state.tracker.evict_idle(Instant::now(), max_idle)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::test_support::{inbound_at, recent, RecordingGateway, GUILD_ID};

    const USER: u64 = 7;

    fn make_service() -> (Arc<RecordingGateway>, ModerationService<RecordingGateway>) {
        let gateway = Arc::new(RecordingGateway::new());
        let service =
            ModerationService::new(Arc::clone(&gateway), ModerationSettings::default(), None);
        (gateway, service)
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    /// Let spawned suspension tasks run without reaching the notice timers.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn privileged_and_automated_authors_are_ignored() {
        let (gateway, service) = make_service();
        let start = Instant::now();

        let mut from_mod = inbound_at(USER, 1, "discord.gg/abc", start);
        from_mod.author_is_privileged = true;
        let mut from_bot = inbound_at(USER, 2, "discord.gg/abc", start);
        from_bot.author_is_automated = true;

        assert!(!service.on_message(from_mod.clone()));
        assert!(!service.on_message(from_bot));
        assert!(service.moderate(from_mod).await.is_empty());
        settle().await;

        assert!(gateway.deleted().is_empty());
        assert!(gateway.sent().is_empty());
        assert_eq!(service.state().tracker.tracked_users(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn five_quick_messages_trigger_one_spam_remediation() {
        let (gateway, service) = make_service();
        let start = Instant::now();

        gateway.set_recent(
            (1..=5)
                .rev()
                .map(|id| recent(id, USER, false, false))
                .chain([recent(50, 99, true, false), recent(51, 8, false, false)])
                .collect(),
        );

        for id in 1..=4 {
            let reports = service.moderate(inbound_at(USER, id, "hi", start + secs(id - 1))).await;
            assert!(reports.is_empty());
        }

        let reports = service.moderate(inbound_at(USER, 5, "hi", start + secs(4))).await;

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.violation, Violation::Spam);
        assert_eq!(report.messages_deleted, 5);
        assert_eq!(report.warning.map(|w| w.warning_count), Some(1));
        assert!(!report.suspension_scheduled);

        assert_eq!(gateway.bulk_deletes(), vec![vec![5, 4, 3, 2, 1]]);
        assert_eq!(service.user_warnings(USER).await, 1);
        assert!(!service.state().coordinator.is_remediating(USER));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_message_during_spam_remediation_is_skipped() {
        let (gateway, service) = make_service();
        gateway.set_fetch_delay(secs(2));
        let start = Instant::now();

        for id in 1..=4 {
            service.moderate(inbound_at(USER, id, "hi", start)).await;
        }

        let first = tokio::spawn({
            let service = service.clone();
            async move { service.moderate(inbound_at(USER, 5, "hi", start)).await }
        });
        settle().await;
        assert!(service.state().coordinator.is_remediating(USER));

        let second = service.moderate(inbound_at(USER, 6, "hi", start)).await;
        let first = first.await.expect("first remediation task");

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(service.user_warnings(USER).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_burst_remediates_at_least_once() {
        let (_gateway, service) = make_service();
        let start = Instant::now();

        let handles: Vec<_> = (1..=15)
            .map(|id| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .moderate(inbound_at(USER, id, "hi", start + Duration::from_millis(id)))
                        .await
                })
            })
            .collect();

        let mut spam_reports = 0;
        for handle in handles {
            spam_reports += handle.await.expect("moderation task").len();
        }

        assert!(spam_reports >= 1);
        assert!(spam_reports <= 15);
        assert!(service.state().tracker.lock(USER).await.history_len() <= 10);
    }

    #[tokio::test(start_paused = true)]
    async fn three_invites_escalate_to_one_hour_suspension() {
        let (gateway, service) = make_service();
        let start = Instant::now();
        let mut counts = Vec::new();

        for (id, at) in [(1, 0), (2, 500), (3, 4000)] {
            let reports = service
                .moderate(inbound_at(USER, id, "join discord.gg/abc", start + secs(at)))
                .await;
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].violation, Violation::Invite);
            counts.push(reports[0].warning.map(|w| w.warning_count));
            settle().await;
        }

        assert_eq!(counts, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(service.user_warnings(USER).await, 0);

        let suspensions = gateway.suspensions();
        assert_eq!(suspensions.len(), 1);
        assert_eq!(suspensions[0].guild_id, GUILD_ID);
        assert_eq!(suspensions[0].user_id, USER);
        assert_eq!(suspensions[0].duration, secs(3600));
        assert!(gateway.deleted().starts_with(&[1, 2, 3]));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sweeps_do_not_forget_pending_invite_warnings() {
        let (gateway, service) = make_service();
        let start = Instant::now();
        let mut counts = Vec::new();

        for (id, at) in [(1, 0), (2, 7200), (3, 14400)] {
            let now = start + secs(at);
            service.state().tracker.evict_idle(now, secs(3600));

            let reports = service
                .moderate(inbound_at(USER, id, "discord.gg/abc", now))
                .await;
            counts.push(reports[0].warning.map(|w| w.warning_count));
            settle().await;
        }

        assert_eq!(counts, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(gateway.suspensions().len(), 1);
        assert_eq!(gateway.suspensions()[0].duration, secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn disallowed_content_suspends_every_time() {
        let (gateway, service) = make_service();
        let start = Instant::now();

        for id in 1..=2 {
            let reports = service
                .moderate(inbound_at(USER, id, "check out this NSFW pic", start + secs(id * 60)))
                .await;
            assert_eq!(reports.len(), 1);
            assert!(reports[0].warning.is_none());
            assert!(reports[0].suspension_scheduled);
            settle().await;
        }

        let suspensions = gateway.suspensions();
        assert_eq!(suspensions.len(), 2);
        assert!(suspensions.iter().all(|s| s.duration == secs(1800)));
        assert_eq!(service.user_warnings(USER).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn content_violation_does_not_block_spam_remediation() {
        let (gateway, service) = make_service();
        gateway.set_fetch_delay(secs(1));
        let start = Instant::now();

        for id in 1..=4 {
            service.moderate(inbound_at(USER, id, "hi", start + secs(id - 1))).await;
        }

        let reports = service
            .moderate(inbound_at(USER, 5, "porn link here", start + secs(4)))
            .await;

        let kinds: Vec<_> = reports.iter().map(|r| r.violation.clone()).collect();
        assert_eq!(kinds.len(), 2);
        assert_eq!(kinds[0], Violation::Spam);
        assert!(matches!(kinds[1], Violation::DisallowedContent { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn spam_escalation_resets_counter_and_suspends_ten_minutes() {
        let (gateway, service) = make_service();
        let start = Instant::now();
        let mut id = 0;

        // Three separate bursts, far enough apart to start fresh windows
        for burst in 0..3u64 {
            for n in 0..5u64 {
                id += 1;
                service
                    .moderate(inbound_at(USER, id, "hi", start + secs(burst * 100 + n)))
                    .await;
            }
            settle().await;
        }

        assert_eq!(service.user_warnings(USER).await, 0);
        let suspensions = gateway.suspensions();
        assert_eq!(suspensions.len(), 1);
        assert_eq!(suspensions[0].duration, secs(600));
        assert_eq!(suspensions[0].reason, "Excessive spam");
    }

    #[test]
    fn update_settings_clamps_and_reports() {
        let (_gateway, service) = make_service();

        let settings = service.update_settings(Some(100), None, Some(5));

        assert_eq!(settings.spam_message_threshold, 20);
        assert_eq!(settings.spam_window_secs, 10);
        assert_eq!(settings.max_warnings, 5);
        assert_eq!(service.settings(), settings);
    }
}
