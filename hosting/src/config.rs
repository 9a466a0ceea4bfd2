//! Operation polling policy.

use std::time::Duration;

use serde::Deserialize;

/// Default delay between two status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default wall-clock bound on waiting for a single operation.
pub const DEFAULT_POLL_DEADLINE: Duration = Duration::from_secs(600);

/// How the operation tracker waits for a remote operation to finish.
///
/// Deserializable so it can be embedded in a caller's own config file:
///
/// ```toml
/// [poll]
/// interval_ms = 500
/// deadline_ms = 300000
/// max_attempts = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between polls in milliseconds.
    pub interval_ms: u64,
    /// Wall-clock bound in milliseconds; `None` waits indefinitely.
    pub deadline_ms: Option<u64>,
    /// Maximum number of status queries; `None` means unbounded.
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            deadline_ms: Some(DEFAULT_POLL_DEADLINE.as_millis() as u64),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Poll back-to-back with no deadline and no attempt limit.
    pub fn unbounded() -> Self {
        Self {
            interval_ms: 0,
            deadline_ms: None,
            max_attempts: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline_ms = deadline.map(|d| d.as_millis() as u64);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.map(Duration::from_millis)
    }
}
