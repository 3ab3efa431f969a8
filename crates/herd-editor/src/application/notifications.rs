//! Single-flight user notifications.
//!
//! A rejected connect gesture is usually repeated: the user drags again, a
//! little to the left, and again.  Each attempt produces the same rejection.
//! The [`NotificationCenter`] collapses those into one visible message per
//! notification key:
//!
//! - while a message with the same key is still queued, new ones are merged
//!   into it;
//! - once it has been taken by the UI, the key stays quiet for the cooldown
//!   window.
//!
//! Timestamps are passed in by the caller so the policy can be tested
//! without sleeping.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default quiet period after a notification was shown.
pub const DEFAULT_NOTIFICATION_COOLDOWN: Duration = Duration::from_millis(4000);

/// A message waiting to be shown by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Coalescing key; equal keys mean "the same problem".
    pub key: String,
    pub message: String,
}

/// Queue of pending notifications with per-key coalescing.
#[derive(Debug)]
pub struct NotificationCenter {
    cooldown: Duration,
    pending: Vec<Notification>,
    last_shown: HashMap<String, Instant>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_COOLDOWN)
    }
}

impl NotificationCenter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            pending: Vec::new(),
            last_shown: HashMap::new(),
        }
    }

    /// Queues `message` under `key` unless an equivalent one is already
    /// queued or was shown less than one cooldown ago.
    ///
    /// Returns `true` if the message was queued.
    pub fn notify(&mut self, key: &str, message: impl Into<String>, now: Instant) -> bool {
        if self.pending.iter().any(|n| n.key == key) {
            debug!(key, "notification already queued; coalesced");
            return false;
        }
        if let Some(shown) = self.last_shown.get(key) {
            if now.saturating_duration_since(*shown) < self.cooldown {
                debug!(key, "notification within cooldown; suppressed");
                return false;
            }
        }
        self.pending.push(Notification {
            key: key.to_string(),
            message: message.into(),
        });
        true
    }

    /// Hands every queued notification to the UI and starts their cooldowns.
    pub fn take(&mut self, now: Instant) -> Vec<Notification> {
        let taken = std::mem::take(&mut self.pending);
        for notification in &taken {
            self.last_shown.insert(notification.key.clone(), now);
        }
        self.last_shown
            .retain(|_, shown| now.saturating_duration_since(*shown) < self.cooldown);
        taken
    }

    pub fn pending(&self) -> &[Notification] {
        &self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "topology-mismatch:PHYSICAL-CLOUD";

    #[test]
    fn test_repeated_notifications_coalesce_while_queued() {
        // Arrange
        let mut center = NotificationCenter::new(Duration::from_secs(4));
        let t0 = Instant::now();

        // Act
        let first = center.notify(KEY, "mismatch", t0);
        let second = center.notify(KEY, "mismatch", t0 + Duration::from_millis(10));

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(center.pending().len(), 1);
    }

    #[test]
    fn test_distinct_keys_are_queued_separately() {
        let mut center = NotificationCenter::default();
        let t0 = Instant::now();

        center.notify(KEY, "mismatch", t0);
        center.notify("persistence", "save failed", t0);

        assert_eq!(center.pending().len(), 2);
    }

    #[test]
    fn test_shown_key_is_quiet_until_cooldown_elapses() {
        // Arrange
        let mut center = NotificationCenter::new(Duration::from_secs(4));
        let t0 = Instant::now();
        center.notify(KEY, "mismatch", t0);

        // Act
        let shown = center.take(t0);
        let during = center.notify(KEY, "mismatch", t0 + Duration::from_secs(1));
        let after = center.notify(KEY, "mismatch", t0 + Duration::from_secs(5));

        // Assert
        assert_eq!(shown.len(), 1);
        assert!(!during, "within cooldown");
        assert!(after, "cooldown elapsed");
    }

    #[test]
    fn test_take_drains_queue() {
        let mut center = NotificationCenter::default();
        let t0 = Instant::now();
        center.notify(KEY, "mismatch", t0);

        assert_eq!(center.take(t0).len(), 1);
        assert!(center.take(t0).is_empty());
    }
}
