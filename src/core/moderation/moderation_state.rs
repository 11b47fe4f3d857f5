// Process-wide moderation state, owned explicitly and shared by Arc.
//
// Nothing here survives a restart.

use super::activity_tracker::ActivityTracker;
use super::moderation_config::{ModerationConfig, ModerationSettings};
use super::violation_coordinator::ViolationCoordinator;

#[derive(Default)]
pub struct ModerationState {
    pub tracker: ActivityTracker,
    pub coordinator: ViolationCoordinator,
    pub config: ModerationConfig,
}

impl ModerationState {
    pub fn new(settings: ModerationSettings) -> Self {
        Self {
            tracker: ActivityTracker::new(),
            coordinator: ViolationCoordinator::new(),
            config: ModerationConfig::new(settings),
        }
    }
}
