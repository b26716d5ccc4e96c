//! Reconnect backoff schedule.

use std::time::Duration;

/// Linear backoff: attempt `n` (1-based) waits `base_delay * n`, up to
/// `max_attempts` scheduled retries. The failure after the last scheduled
/// retry is terminal — the caller surfaces it and stops retrying until told
/// to reconnect explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            max_attempts: 3,
        }
    }
}

impl ReconnectPolicy {
    #[must_use]
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            base_delay,
            max_attempts,
        }
    }

    /// Delay before retry `attempt` (1-based), or `None` when the schedule is
    /// exhausted.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            None
        } else {
            Some(self.base_delay * attempt)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// With a 2000 ms base, retries schedule at 2000, 4000, 6000 ms and the
    /// fourth failure exhausts the policy.
    #[test]
    fn schedule_is_linear_and_bounded() {
        let policy = ReconnectPolicy::new(Duration::from_millis(2000), 3);
        assert_eq!(policy.delay_for(1), Some(Duration::from_millis(2000)));
        assert_eq!(policy.delay_for(2), Some(Duration::from_millis(4000)));
        assert_eq!(policy.delay_for(3), Some(Duration::from_millis(6000)));
        assert_eq!(policy.delay_for(4), None);
    }

    #[test]
    fn attempt_zero_is_never_scheduled() {
        assert_eq!(ReconnectPolicy::default().delay_for(0), None);
    }
}
