//! Automatic reconnect policy
//!
//! Exponential backoff with jitter. Disabled by default: a genuine
//! connectivity failure then waits for a manual reconnect.

use std::time::Duration;

use rand::Rng;

/// Backoff schedule applied after connectivity failures
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    /// Whether hosts should reconnect on their own
    pub enabled: bool,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Growth factor per attempt (at least 1.0)
    pub multiplier: f64,
    /// Random spread as a fraction of the delay, in `[0, 1]`
    pub jitter: f64,
    /// Give up after this many consecutive attempts (None = never)
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            jitter: 0.2,
            max_attempts: Some(10),
        }
    }
}

impl ReconnectPolicy {
    /// Policy with reconnect turned on and default timings
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), without jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(64) as i32);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay before retry number `attempt`, or None if no retry should happen
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if !self.enabled {
            return None;
        }
        if self.max_attempts.is_some_and(|max| attempt >= max) {
            return None;
        }

        let base = self.base_delay(attempt);
        if self.jitter <= 0.0 {
            return Some(base);
        }

        let spread = self.jitter.min(1.0);
        let factor = 1.0 + rand::thread_rng().gen_range(-spread..=spread);
        let jittered = (base.as_millis() as f64 * factor).min(self.max_delay.as_millis() as f64);
        Some(Duration::from_millis(jittered.max(0.0) as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> ReconnectPolicy {
        ReconnectPolicy {
            jitter: 0.0,
            ..ReconnectPolicy::enabled()
        }
    }

    #[test]
    fn test_disabled_never_retries() {
        assert_eq!(ReconnectPolicy::default().delay_for_attempt(0), None);
    }

    #[test]
    fn test_exponential_growth_capped() {
        let policy = no_jitter();
        assert_eq!(policy.delay_for_attempt(0), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for_attempt(6), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_monotonic_until_cap() {
        let policy = no_jitter();
        let delays: Vec<_> = (0..10).map(|n| policy.base_delay(n)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= policy.max_delay));
    }

    #[test]
    fn test_max_attempts_exhausted() {
        let policy = ReconnectPolicy {
            max_attempts: Some(2),
            ..no_jitter()
        };
        assert!(policy.delay_for_attempt(1).is_some());
        assert_eq!(policy.delay_for_attempt(2), None);
    }

    #[test]
    fn test_jitter_within_bounds() {
        let policy = ReconnectPolicy::enabled();
        for _ in 0..100 {
            let delay = policy.delay_for_attempt(1).unwrap();
            assert!(delay >= Duration::from_millis(1599));
            assert!(delay <= Duration::from_millis(2401));
        }
    }
}
