//! Reconnect Policy
//!
//! How long to wait before reconnect attempt N, and whether to keep
//! trying at all. The default is the console's historical behavior:
//! a fixed 2 second delay, unlimited attempts.

use crate::constants;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
enum Backoff {
    Fixed(Duration),
    Exponential { base: Duration, cap: Duration },
}

/// Reconnect scheduling policy
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    backoff: Backoff,
    jitter: bool,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_millis(constants::get_reconnect_delay_ms()))
    }
}

impl RetryPolicy {
    /// Fixed delay, unlimited attempts
    pub fn fixed(delay: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed(delay),
            jitter: false,
            max_attempts: None,
        }
    }

    /// Exponential backoff doubling from `base` up to `cap`, jittered
    pub fn exponential(base: Duration, cap: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential { base, cap },
            jitter: true,
            max_attempts: None,
        }
    }

    /// Give up after `n` consecutive failed attempts; the client then
    /// enters its terminal state
    pub fn with_max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = Some(n);
        self
    }

    /// Make delays deterministic
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Delay before reconnect attempt `attempt` (1-based, counted since
    /// the last successful connect). `None` means the policy is exhausted.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if let Some(max) = self.max_attempts {
            if attempt > max {
                return None;
            }
        }
        let delay = match self.backoff {
            Backoff::Fixed(d) => d,
            Backoff::Exponential { base, cap } => {
                let exp = attempt.saturating_sub(1).min(20);
                base.saturating_mul(2u32.saturating_pow(exp)).min(cap)
            }
        };
        if self.jitter {
            Some(apply_jitter(delay))
        } else {
            Some(delay)
        }
    }
}

/// Spread a delay by roughly one eighth in both directions
fn apply_jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis == 0 {
        return delay;
    }
    let spread = (millis / 8).max(1);
    let low = millis.saturating_sub(spread);
    let high = millis + spread;
    Duration::from_millis(rand::thread_rng().gen_range(low..=high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delay_never_grows() {
        let policy = RetryPolicy::fixed(Duration::from_millis(2000));
        for attempt in [1, 2, 50, 5000] {
            assert_eq!(policy.delay_for(attempt), Some(Duration::from_millis(2000)));
        }
    }

    #[test]
    fn test_exponential_doubles_up_to_cap() {
        let policy =
            RetryPolicy::exponential(Duration::from_secs(1), Duration::from_secs(30)).without_jitter();
        assert_eq!(policy.delay_for(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_secs(4)));
        assert_eq!(policy.delay_for(6), Some(Duration::from_secs(30)));
        assert_eq!(policy.delay_for(50), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_max_attempts_exhausts() {
        let policy = RetryPolicy::fixed(Duration::from_secs(2)).with_max_attempts(3);
        assert!(policy.delay_for(1).is_some());
        assert!(policy.delay_for(3).is_some());
        assert_eq!(policy.delay_for(4), None);
        assert_eq!(policy.delay_for(100), None);
    }

    #[test]
    fn test_jitter_stays_near_the_base_delay() {
        let policy = RetryPolicy::exponential(Duration::from_secs(8), Duration::from_secs(60));
        for _ in 0..200 {
            let delay = policy.delay_for(1).unwrap();
            assert!(delay >= Duration::from_secs(7), "too short: {:?}", delay);
            assert!(delay <= Duration::from_secs(9), "too long: {:?}", delay);
        }
    }

    #[test]
    fn test_default_is_fixed_two_seconds() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), policy.delay_for(50));
    }
}
