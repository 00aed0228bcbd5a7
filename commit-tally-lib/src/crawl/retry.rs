use core::time::Duration;

/// How often and how patiently a failed page request is retried.
///
/// Delays grow exponentially from `base_delay` and are capped at `max_delay`. A `Retry-After`
/// hint from the remote takes precedence over the computed delay and is not capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per page, including the first one. Zero means no limit.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Keep retrying for as long as it takes.
    #[must_use]
    pub const fn unlimited(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: 0,
            base_delay,
            max_delay,
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones.
    #[must_use]
    pub const fn allows_retry(&self, attempts_made: u32) -> bool {
        self.max_attempts == 0 || attempts_made < self.max_attempts
    }

    /// Delay before the attempt following `attempts_made` failed ones.
    #[must_use]
    pub fn backoff(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Delay before the next attempt, honoring the remote's hint if it gave one.
    #[must_use]
    pub fn delay_for(&self, attempts_made: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.backoff(attempts_made))
    }
}
