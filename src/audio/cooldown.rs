//! Per-class cooldown ledger

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Last play time per class
///
/// Entries never expire; an entry older than the window simply stops
/// mattering.
#[derive(Debug, Clone)]
pub struct CooldownLedger {
    window: Duration,
    last_played: HashMap<String, Instant>,
}

impl CooldownLedger {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_played: HashMap::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Claim a play for `class` at `now`
    ///
    /// Returns false, leaving the ledger untouched, if the class played less
    /// than one window ago. Class names are compared case-insensitively.
    pub fn try_acquire(&mut self, class: &str, now: Instant) -> bool {
        let key = class.trim().to_ascii_lowercase();

        if let Some(last) = self.last_played.get(&key) {
            if now.saturating_duration_since(*last) < self.window {
                return false;
            }
        }

        self.last_played.insert(key, now);
        true
    }

    /// When `class` last played
    pub fn last_played(&self, class: &str) -> Option<Instant> {
        self.last_played
            .get(&class.trim().to_ascii_lowercase())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.last_played.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_played.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_blocks_repeats() {
        let mut ledger = CooldownLedger::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(ledger.try_acquire("person", t0));
        assert!(!ledger.try_acquire("person", t0 + Duration::from_millis(500)));
        assert!(!ledger.try_acquire("Person", t0 + Duration::from_millis(999)));
        assert!(ledger.try_acquire("person", t0 + Duration::from_millis(1000)));
    }

    #[test]
    fn test_blocked_attempt_does_not_extend_window() {
        let mut ledger = CooldownLedger::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        ledger.try_acquire("car", t0);
        ledger.try_acquire("car", t0 + Duration::from_millis(900));

        assert_eq!(ledger.last_played("car"), Some(t0));
        assert!(ledger.try_acquire("car", t0 + Duration::from_millis(1100)));
    }

    #[test]
    fn test_classes_are_independent() {
        let mut ledger = CooldownLedger::new(Duration::from_millis(1000));
        let t0 = Instant::now();

        assert!(ledger.try_acquire("person", t0));
        assert!(ledger.try_acquire("dog", t0));
        assert_eq!(ledger.len(), 2);
    }
}
