//! Reconnect delays for the status channel
//!
//! Delays grow linearly: `base + increment * (attempt - 1)`, capped at
//! `max_delay`. Attempts are counted per outage and reset on connect.

use crate::config::schema::StatusConfig;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub increment: Duration,
    pub max_delay: Duration,
    /// Consecutive failed attempts allowed before giving up
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&StatusConfig::default())
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &StatusConfig) -> Self {
        Self {
            base_delay: Duration::from_millis(config.base_delay_ms),
            increment: Duration::from_millis(config.delay_increment_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.base_delay_ms)),
            max_attempts: config.max_attempts,
        }
    }

    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let steps = attempt.saturating_sub(1);
        let delay = self
            .increment
            .checked_mul(steps)
            .and_then(|extra| self.base_delay.checked_add(extra))
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }

    /// Whether attempt `attempt` (1-based) may still be made
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ReconnectPolicy {
        ReconnectPolicy {
            base_delay: Duration::from_millis(500),
            increment: Duration::from_millis(1000),
            max_delay: Duration::from_millis(2000),
            max_attempts: 4,
        }
    }

    #[test]
    fn delay_grows_linearly_then_caps() {
        let p = policy();
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_millis(1500));
        assert_eq!(p.delay_for(3), Duration::from_millis(2000));
        assert_eq!(p.delay_for(50), Duration::from_millis(2000));
        assert_eq!(p.delay_for(u32::MAX), Duration::from_millis(2000));
    }

    #[test]
    fn attempts_are_bounded() {
        let p = policy();
        assert!(p.allows(1));
        assert!(p.allows(4));
        assert!(!p.allows(5));
    }

    #[test]
    fn defaults_match_config() {
        let p = ReconnectPolicy::default();
        assert_eq!(p.base_delay, Duration::from_secs(1));
        assert_eq!(p.max_delay, Duration::from_secs(10));
        assert_eq!(p.max_attempts, 5);
    }
}
