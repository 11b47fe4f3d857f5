// Runtime-tunable moderation settings.
//
// Every message reads these, while admins change them rarely, so each field is
// a plain atomic. Writes clamp into range and never fail; readers may see a
// slightly stale value, which only affects the next detection.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub const SPAM_THRESHOLD_RANGE: RangeInclusive<u32> = 3..=20;
pub const SPAM_WINDOW_SECS_RANGE: RangeInclusive<u32> = 5..=60;
pub const MAX_WARNINGS_RANGE: RangeInclusive<u32> = 1..=10;

/// Plain snapshot of the moderation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationSettings {
    /// Messages inside the window that count as spam
    pub spam_message_threshold: u32,
    /// Sliding window length in seconds
    pub spam_window_secs: u32,
    /// Warnings before a spam or invite suspension
    pub max_warnings: u32,
}

impl Default for ModerationSettings {
    fn default() -> Self {
        Self {
            spam_message_threshold: 5, // 5 messages...
            spam_window_secs: 10,      // ...in 10 seconds
            max_warnings: 3,           // 3 warnings before timeout
        }
    }
}

impl ModerationSettings {
    /// Pull every field into its documented bounds.
    pub fn clamped(self) -> Self {
        Self {
            spam_message_threshold: clamp_to(self.spam_message_threshold, SPAM_THRESHOLD_RANGE),
            spam_window_secs: clamp_to(self.spam_window_secs, SPAM_WINDOW_SECS_RANGE),
            max_warnings: clamp_to(self.max_warnings, MAX_WARNINGS_RANGE),
        }
    }
}

fn clamp_to(value: u32, range: RangeInclusive<u32>) -> u32 {
    value.clamp(*range.start(), *range.end())
}

#[derive(Debug)]
pub struct ModerationConfig {
    spam_message_threshold: AtomicU32,
    spam_window_secs: AtomicU32,
    max_warnings: AtomicU32,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self::new(ModerationSettings::default())
    }
}

impl ModerationConfig {
    pub fn new(settings: ModerationSettings) -> Self {
        let settings = settings.clamped();
        Self {
            spam_message_threshold: AtomicU32::new(settings.spam_message_threshold),
            spam_window_secs: AtomicU32::new(settings.spam_window_secs),
            max_warnings: AtomicU32::new(settings.max_warnings),
        }
    }

    pub fn spam_message_threshold(&self) -> u32 {
        self.spam_message_threshold.load(Ordering::Relaxed)
    }

    pub fn spam_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.spam_window_secs.load(Ordering::Relaxed)))
    }

    pub fn max_warnings(&self) -> u32 {
        self.max_warnings.load(Ordering::Relaxed)
    }

    /// Returns the value actually stored.
    pub fn set_spam_message_threshold(&self, value: u32) -> u32 {
        let value = clamp_to(value, SPAM_THRESHOLD_RANGE);
        self.spam_message_threshold.store(value, Ordering::Relaxed);
        value
    }

    /// Returns the value actually stored.
    pub fn set_spam_window_secs(&self, value: u32) -> u32 {
        let value = clamp_to(value, SPAM_WINDOW_SECS_RANGE);
        self.spam_window_secs.store(value, Ordering::Relaxed);
        value
    }

    /// Returns the value actually stored.
    pub fn set_max_warnings(&self, value: u32) -> u32 {
        let value = clamp_to(value, MAX_WARNINGS_RANGE);
        self.max_warnings.store(value, Ordering::Relaxed);
        value
    }

    pub fn snapshot(&self) -> ModerationSettings {
        ModerationSettings {
            spam_message_threshold: self.spam_message_threshold(),
            spam_window_secs: self.spam_window_secs.load(Ordering::Relaxed),
            max_warnings: self.max_warnings(),
        }
    }
}
