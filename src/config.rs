//! Relay timing configuration, parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every wait the relay performs is bounded and tunable: the outcome
//! timeout, the post-write settle delay, and the re-query backoff. Missing
//! or malformed variables fall back to defaults rather than failing startup.

use std::time::Duration;

use rand::Rng;

const DEFAULT_RESULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 500;
const DEFAULT_SETTLE_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_SETTLE_BACKOFF_BASE_MS: u64 = 250;
const DEFAULT_SETTLE_MAX_BACKOFF_MS: u64 = 2_000;

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// SETTLE
// =============================================================================

/// Bounds for the consistency wait after a write.
///
/// The destination acknowledges a write before the written record becomes
/// visible to reads. The settle loop waits `initial_delay`, re-queries, and
/// backs off between further attempts until the record shows up or
/// `max_attempts` is spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleConfig {
    pub initial_delay: Duration,
    /// At least 1. The loop always issues a final query whose payload is
    /// used even if the record never appeared.
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub max_backoff: Duration,
}

impl SettleConfig {
    /// Delay before the attempt after `attempt`. Exponential, capped, with
    /// up to 25% added jitter so chained panels do not re-query in lockstep.
    #[must_use]
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(6);
        let capped = self.backoff_base.saturating_mul(1 << shift).min(self.max_backoff);
        capped.mul_f64(1.0 + rand::rng().random_range(0.0..0.25))
    }
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            max_attempts: DEFAULT_SETTLE_MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(DEFAULT_SETTLE_BACKOFF_BASE_MS),
            max_backoff: Duration::from_millis(DEFAULT_SETTLE_MAX_BACKOFF_MS),
        }
    }
}

// =============================================================================
// RELAY
// =============================================================================

/// Timing bounds for command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Longest the relay waits for any outcome before declaring the target
    /// unreachable. There is no unbounded wait.
    pub result_timeout: Duration,
    pub settle: SettleConfig,
}

impl RelayConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let settle = SettleConfig {
            initial_delay: Duration::from_millis(env_parse(
                "RELAY_SETTLE_DELAY_MS",
                DEFAULT_SETTLE_DELAY_MS,
            )),
            max_attempts: env_parse("RELAY_SETTLE_MAX_ATTEMPTS", DEFAULT_SETTLE_MAX_ATTEMPTS).max(1),
            backoff_base: Duration::from_millis(env_parse(
                "RELAY_SETTLE_BACKOFF_BASE_MS",
                DEFAULT_SETTLE_BACKOFF_BASE_MS,
            )),
            max_backoff: Duration::from_millis(env_parse(
                "RELAY_SETTLE_MAX_BACKOFF_MS",
                DEFAULT_SETTLE_MAX_BACKOFF_MS,
            )),
        };

        Self {
            result_timeout: Duration::from_millis(env_parse(
                "RELAY_RESULT_TIMEOUT_MS",
                DEFAULT_RESULT_TIMEOUT_MS,
            )),
            settle,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            result_timeout: Duration::from_millis(DEFAULT_RESULT_TIMEOUT_MS),
            settle: SettleConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
