//! Runtime configuration.
//!
//! Defaults can be overridden from environment variables:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `THRESHOLDPAD_DEBOUNCE_MS` | quiet period after an edit | 200 |
//! | `THRESHOLDPAD_BUSY_RETRIES` | re-issues while the engine is busy | 8 |
//! | `THRESHOLDPAD_KEYGEN_ATTEMPTS` | keys sampled per generation | 20 |
//! | `THRESHOLDPAD_SCRUB_BUFFERS` | zero engine buffers after each call | true |

use std::env;
use std::time::Duration;

use crate::keygen::DEFAULT_KEYGEN_ATTEMPTS;

/// Backoff schedule for re-issuing an operation that found the engine busy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first re-issue
    pub initial_delay: Duration,
    /// Factor applied to the delay after each re-issue
    pub multiplier: u32,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Re-issues before giving up
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Delay before re-issue number `attempt` (starting at 1)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(200),
            multiplier: 2,
            max_delay: Duration::from_millis(3_200),
            max_attempts: 8,
        }
    }
}

/// Everything tunable about a pad
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PadConfig {
    /// Quiet period after the last edit before a panel runs
    pub debounce: Duration,
    /// Re-issue schedule while the engine is busy
    pub busy_retry: RetryPolicy,
    /// Keys sampled per generation before giving up
    pub keygen_attempts: u32,
    /// Zero engine buffers after every operation
    pub scrub_buffers: bool,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(200),
            busy_retry: RetryPolicy::default(),
            keygen_attempts: DEFAULT_KEYGEN_ATTEMPTS,
            scrub_buffers: true,
        }
    }
}

impl PadConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "THRESHOLDPAD_DEBOUNCE_MS") {
            config.debounce = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var(&lookup, "THRESHOLDPAD_BUSY_RETRIES") {
            config.busy_retry.max_attempts = retries;
        }
        if let Some(attempts) = parse_var::<u32>(&lookup, "THRESHOLDPAD_KEYGEN_ATTEMPTS") {
            config.keygen_attempts = attempts.max(1);
        }
        if let Some(scrub) = parse_var(&lookup, "THRESHOLDPAD_SCRUB_BUFFERS") {
            config.scrub_buffers = scrub;
        }

        config
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_schedule() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=8)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, [200, 400, 800, 1600, 3200, 3200, 3200, 3200]);
    }

    #[test]
    fn test_delay_does_not_overflow() {
        let policy = RetryPolicy {
            multiplier: 10,
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_for(u32::MAX), policy.max_delay);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = PadConfig::from_lookup(lookup(&[
            ("THRESHOLDPAD_DEBOUNCE_MS", "50"),
            ("THRESHOLDPAD_BUSY_RETRIES", "3"),
            ("THRESHOLDPAD_KEYGEN_ATTEMPTS", "0"),
            ("THRESHOLDPAD_SCRUB_BUFFERS", "false"),
        ]));
        assert_eq!(config.debounce, Duration::from_millis(50));
        assert_eq!(config.busy_retry.max_attempts, 3);
        assert_eq!(config.keygen_attempts, 1);
        assert!(!config.scrub_buffers);
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let config = PadConfig::from_lookup(lookup(&[
            ("THRESHOLDPAD_DEBOUNCE_MS", "soon"),
            ("THRESHOLDPAD_SCRUB_BUFFERS", "maybe"),
        ]));
        assert_eq!(config, PadConfig::default());
    }
}
