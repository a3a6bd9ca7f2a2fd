//! Configuration for the sync engine and scheduler.

use crate::error::{SyncError, SyncOutcome};
use std::time::Duration;

/// Shortest allowed sync interval, in hours.
pub const MIN_INTERVAL_HOURS: u32 = 1;
/// Longest allowed sync interval, in hours.
pub const MAX_INTERVAL_HOURS: u32 = 24;

const HOUR: Duration = Duration::from_secs(60 * 60);

/// What to store as the cursor when a pull response has no server timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorFallback {
    /// Store the device's current time.
    ///
    /// Devices with skewed clocks may then skip changes they never saw.
    #[default]
    DeviceClock,
    /// Leave the previous cursor untouched.
    KeepPrevious,
}

/// Configuration for the sync engine.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Cursor policy for responses without a server timestamp.
    pub cursor_fallback: CursorFallback,
}

impl EngineConfig {
    /// Creates the default engine configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cursor fallback policy.
    pub fn with_cursor_fallback(mut self, fallback: CursorFallback) -> Self {
        self.cursor_fallback = fallback;
        self
    }
}

/// Configuration for periodic background sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Hours between periodic runs, in `1..=24`.
    pub interval_hours: u32,
    /// Only run on unmetered networks.
    pub only_wifi: bool,
    /// Whether periodic sync is registered at all.
    pub enabled: bool,
    /// Retry behaviour for transient failures.
    pub retry: RetryConfig,
    /// How often to re-check an unmet network constraint.
    pub constraint_poll: Duration,
}

impl SchedulerConfig {
    /// Creates an enabled configuration.
    pub fn new(interval_hours: u32, only_wifi: bool) -> Self {
        Self {
            interval_hours,
            only_wifi,
            enabled: true,
            retry: RetryConfig::default(),
            constraint_poll: Duration::from_secs(60),
        }
    }

    /// Sets whether periodic sync is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the network constraint poll interval.
    pub fn with_constraint_poll(mut self, poll: Duration) -> Self {
        self.constraint_poll = poll;
        self
    }

    /// Checks the interval bounds and poll interval.
    pub fn validate(&self) -> SyncOutcome<()> {
        if !(MIN_INTERVAL_HOURS..=MAX_INTERVAL_HOURS).contains(&self.interval_hours) {
            return Err(SyncError::InvalidConfig(format!(
                "interval_hours must be within {}..={}, got {}",
                MIN_INTERVAL_HOURS, MAX_INTERVAL_HOURS, self.interval_hours
            )));
        }
        if self.constraint_poll.is_zero() {
            return Err(SyncError::InvalidConfig(
                "constraint_poll must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The periodic interval.
    pub fn interval(&self) -> Duration {
        HOUR * self.interval_hours
    }

    /// The flex window at the end of each period: `min(interval, 1h)`.
    pub fn flex(&self) -> Duration {
        self.interval().min(HOUR)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(6, false)
    }
}

/// Backoff between the attempts of one scheduled sync.
///
/// Only failures that [`SyncError::is_retryable`] reports as transient are
/// retried. The wait before the second attempt is `first_backoff`; each
/// later wait doubles, up to `max_backoff`. Up to `jitter` of the wait is
/// added at random so devices that failed together do not retry together.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts per invocation, the first one included.
    pub max_attempts: u32,
    /// Wait before the second attempt.
    pub first_backoff: Duration,
    /// Longest single wait, before jitter.
    pub max_backoff: Duration,
    /// Fraction of the wait added at random, within `[0, 1]`.
    pub jitter: f64,
}

impl RetryConfig {
    /// Allows `max_attempts` attempts, starting at a 30 second backoff.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            first_backoff: Duration::from_secs(30),
            max_backoff: Duration::from_secs(10 * 60),
            jitter: 0.25,
        }
    }

    /// Gives up after the first failure.
    pub fn single_attempt() -> Self {
        Self {
            max_attempts: 1,
            first_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter: 0.0,
        }
    }

    /// Sets the wait before the second attempt.
    pub fn with_first_backoff(mut self, backoff: Duration) -> Self {
        self.first_backoff = backoff;
        self
    }

    /// Caps each wait.
    pub fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    /// Sets the random fraction added to each wait; 0 disables it.
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    /// Wait before the attempt with index `attempt`; the first attempt
    /// (index 0) starts at once.
    pub fn backoff_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let doublings = (attempt - 1).min(16);
        let wait = self
            .first_backoff
            .saturating_mul(1 << doublings)
            .min(self.max_backoff);

        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter > 0.0 {
            wait.mul_f64(1.0 + jitter * rand::random::<f64>())
        } else {
            wait
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_bounds() {
        assert!(SchedulerConfig::new(1, false).validate().is_ok());
        assert!(SchedulerConfig::new(24, true).validate().is_ok());
        assert!(matches!(
            SchedulerConfig::new(0, false).validate(),
            Err(SyncError::InvalidConfig(_))
        ));
        assert!(matches!(
            SchedulerConfig::new(25, false).validate(),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn flex_never_exceeds_one_hour() {
        assert_eq!(SchedulerConfig::new(1, false).flex(), HOUR);
        assert_eq!(SchedulerConfig::new(12, false).flex(), HOUR);
        assert_eq!(SchedulerConfig::new(3, false).interval(), HOUR * 3);
    }

    #[test]
    fn default_retry_makes_three_attempts() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.with_jitter(0.0).backoff_before(1), Duration::from_secs(30));
        assert_eq!(RetryConfig::single_attempt().max_attempts, 1);
    }

    #[test]
    fn backoff_doubles_until_capped() {
        let retry = RetryConfig::new(6)
            .with_first_backoff(Duration::from_secs(10))
            .with_max_backoff(Duration::from_secs(60))
            .with_jitter(0.0);

        let waits: Vec<u64> = (0..6).map(|n| retry.backoff_before(n).as_secs()).collect();
        assert_eq!(waits, vec![0, 10, 20, 40, 60, 60]);
        assert_eq!(retry.backoff_before(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn jitter_only_lengthens_the_wait() {
        let retry = RetryConfig::new(3)
            .with_first_backoff(Duration::from_secs(10))
            .with_jitter(0.5);

        for _ in 0..50 {
            let wait = retry.backoff_before(1);
            assert!(wait >= Duration::from_secs(10));
            assert!(wait <= Duration::from_secs(15));
        }
    }

    #[test]
    fn engine_config_defaults_to_device_clock() {
        assert_eq!(EngineConfig::new().cursor_fallback, CursorFallback::DeviceClock);
        let config = EngineConfig::new().with_cursor_fallback(CursorFallback::KeepPrevious);
        assert_eq!(config.cursor_fallback, CursorFallback::KeepPrevious);
    }
}
