// Violation coordinator - de-duplicates spam remediation per user and keeps
// track of the engine's own notices so cleanup sweeps never remove them.

use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct ViolationCoordinator {
    active_remediations: DashSet<u64>,
    protected_message_ids: DashSet<u64>,
}

impl ViolationCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the user's remediation slot. Returns `None` when a remediation is
    /// already running; callers skip instead of waiting.
    pub fn try_enter_remediation(&self, user_id: u64) -> Option<RemediationGuard<'_>> {
        if self.active_remediations.insert(user_id) {
            Some(RemediationGuard {
                coordinator: self,
                user_id,
            })
        } else {
            None
        }
    }

    pub fn exit_remediation(&self, user_id: u64) {
        self.active_remediations.remove(&user_id);
    }

    pub fn is_remediating(&self, user_id: u64) -> bool {
        self.active_remediations.contains(&user_id)
    }

    pub fn protect_message(&self, message_id: u64) {
        self.protected_message_ids.insert(message_id);
    }

    pub fn release_message(&self, message_id: u64) {
        self.protected_message_ids.remove(&message_id);
    }

    pub fn is_protected(&self, message_id: u64) -> bool {
        self.protected_message_ids.contains(&message_id)
    }

    pub fn protected_count(&self) -> usize {
        self.protected_message_ids.len()
    }
}

/// Held for the duration of one spam remediation. Dropping it frees the slot,
/// so every exit path (including errors and panics) releases the user.
#[derive(Debug)]
pub struct RemediationGuard<'a> {
    coordinator: &'a ViolationCoordinator,
    user_id: u64,
}

impl Drop for RemediationGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.exit_remediation(self.user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_entry_is_refused_until_first_exits() {
        let coordinator = ViolationCoordinator::new();

        let guard = coordinator.try_enter_remediation(42);
        assert!(guard.is_some());
        assert!(coordinator.try_enter_remediation(42).is_none());
        assert!(coordinator.is_remediating(42));

        // Other users are unaffected
        assert!(coordinator.try_enter_remediation(43).is_some());

        drop(guard);
        assert!(!coordinator.is_remediating(42));
        assert!(coordinator.try_enter_remediation(42).is_some());
    }

    #[test]
    fn guard_releases_on_panic() {
        let coordinator = ViolationCoordinator::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = coordinator.try_enter_remediation(9);
            panic!("remediation blew up");
        }));

        assert!(result.is_err());
        assert!(!coordinator.is_remediating(9));
    }

    #[test]
    fn protected_ids_are_tracked_until_released() {
        let coordinator = ViolationCoordinator::new();

        coordinator.protect_message(1000);
        assert!(coordinator.is_protected(1000));
        assert_eq!(coordinator.protected_count(), 1);

        coordinator.release_message(1000);
        assert!(!coordinator.is_protected(1000));
    }
}
