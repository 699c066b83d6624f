//! Lookup retry and request logging settings for the REST connector.
//!
//! Retries only ever apply to the idempotent existence lookup. Writes are
//! sent exactly once per pipeline run; the pipeline re-probes instead.

use rand::Rng;
use std::time::Duration;

/// Exponential backoff for the existence lookup.
///
/// Which failures are worth retrying is decided by
/// [`ConnectorError::is_transient`](syncmark_connector::error::ConnectorError::is_transient);
/// this only says how often and how long to wait.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each further one.
    pub initial_backoff: Duration,
    /// Upper bound for a single wait.
    pub max_backoff: Duration,
    /// Spread each wait by up to a quarter in either direction.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Single attempt, no retries.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(0)
    }

    #[must_use]
    pub fn with_initial_backoff(mut self, ms: u64) -> Self {
        self.initial_backoff = Duration::from_millis(ms);
        self
    }

    #[must_use]
    pub fn with_max_backoff(mut self, ms: u64) -> Self {
        self.max_backoff = Duration::from_millis(ms);
        self
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// Wait before retry number `retry` (1-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(retry - 1);
        let wait = self
            .initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff);
        if !self.jitter {
            return wait;
        }
        let spread = rand::thread_rng().gen_range(0.75..=1.25);
        wait.mul_f64(spread)
    }
}

/// How much of each request the connector logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogVerbosity {
    /// Nothing.
    Quiet,
    /// URL, method and status.
    #[default]
    Normal,
    /// Also headers.
    Verbose,
    /// Also bodies.
    Debug,
}

impl LogVerbosity {
    pub fn is_enabled(&self) -> bool {
        *self != LogVerbosity::Quiet
    }

    pub fn log_headers(&self) -> bool {
        matches!(self, LogVerbosity::Verbose | LogVerbosity::Debug)
    }

    pub fn log_bodies(&self) -> bool {
        *self == LogVerbosity::Debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(100));
        assert!(config.jitter);
        assert!(config.allows_retry_after(3));
        assert!(!config.allows_retry_after(4));
    }

    #[test]
    fn test_disabled() {
        let config = RetryConfig::disabled();
        assert_eq!(config.max_retries, 0);
        assert!(!config.allows_retry_after(1));
    }

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let config = RetryConfig::default()
            .with_initial_backoff(100)
            .with_max_backoff(1_000)
            .without_jitter();

        assert_eq!(config.backoff(0), Duration::ZERO);
        assert_eq!(config.backoff(1), Duration::from_millis(100));
        assert_eq!(config.backoff(2), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(400));
        assert_eq!(config.backoff(10), Duration::from_millis(1_000));
        assert_eq!(config.backoff(40), Duration::from_millis(1_000));
    }

    #[test]
    fn test_backoff_jitter_bounds() {
        let config = RetryConfig::default().with_initial_backoff(400);
        for _ in 0..50 {
            let wait = config.backoff(1).as_millis();
            assert!((300..=500).contains(&wait), "backoff {wait} out of range");
        }
    }

    #[test]
    fn test_log_verbosity_levels() {
        assert!(!LogVerbosity::Quiet.is_enabled());
        assert!(LogVerbosity::Normal.is_enabled());
        assert!(!LogVerbosity::Normal.log_headers());
        assert!(LogVerbosity::Verbose.log_headers());
        assert!(!LogVerbosity::Verbose.log_bodies());
        assert!(LogVerbosity::Debug.log_bodies());
        assert_eq!(LogVerbosity::default(), LogVerbosity::Normal);
    }
}
