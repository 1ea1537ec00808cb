/*!
 * Emulation Configuration
 *
 * Runtime configuration for the signal subsystem's background machinery
 */

use super::limits::{INTERRUPT_CHANNEL_PREFIX, WATCHER_JOIN_TIMEOUT, WATCHER_POLL_INTERVAL};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signal subsystem configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CompatConfig {
    /// Bound on each watcher wait before the shutdown flag is re-checked
    pub watcher_poll_interval: Duration,
    /// Bound on joining the watcher thread at teardown
    pub watcher_join_timeout: Duration,
    /// Prefix of the external interrupt channel name
    pub channel_prefix: String,
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            watcher_poll_interval: WATCHER_POLL_INTERVAL,
            watcher_join_timeout: WATCHER_JOIN_TIMEOUT,
            channel_prefix: INTERRUPT_CHANNEL_PREFIX.to_string(),
        }
    }
}

impl CompatConfig {
    /// Build configuration from environment variables, falling back to defaults
    ///
    /// Environment variables:
    /// - COMPAT_WATCHER_POLL_MS: watcher poll interval in milliseconds
    /// - COMPAT_WATCHER_JOIN_MS: watcher join timeout in milliseconds
    /// - COMPAT_CHANNEL_PREFIX: interrupt channel name prefix
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let millis = |key: &str| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
        };

        Self {
            watcher_poll_interval: millis("COMPAT_WATCHER_POLL_MS")
                .unwrap_or(defaults.watcher_poll_interval),
            watcher_join_timeout: millis("COMPAT_WATCHER_JOIN_MS")
                .unwrap_or(defaults.watcher_join_timeout),
            channel_prefix: lookup("COMPAT_CHANNEL_PREFIX")
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.channel_prefix),
        }
    }

    /// Configuration with a short watcher poll, for latency-sensitive hosts
    pub fn responsive() -> Self {
        Self {
            watcher_poll_interval: Duration::from_millis(50),
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.watcher_poll_interval = interval;
        self
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.watcher_join_timeout = timeout;
        self
    }

    pub fn with_channel_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.channel_prefix = prefix.into();
        self
    }
}
