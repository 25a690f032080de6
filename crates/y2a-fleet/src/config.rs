//! Directory reader configuration.

use std::time::Duration;

/// What to do when the first fetch at startup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupPolicy {
    /// Return the error from `start`; the process cannot run without a fleet view.
    #[default]
    Strict,
    /// Start with an empty fleet and let background polling populate it.
    Lenient,
}

impl StartupPolicy {
    fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "empty" => StartupPolicy::Lenient,
            _ => StartupPolicy::Strict,
        }
    }
}

/// Directory reader configuration.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Consul HTTP address, e.g. `http://127.0.0.1:8500`
    pub consul_addr: String,
    /// Key prefix the fleet is registered under
    pub prefix: String,
    /// Delay between polls
    pub poll_interval: Duration,
    /// Blocking-query wait; `None` means plain re-polls
    pub wait: Option<Duration>,
    /// Per-request timeout, on top of `wait`
    pub request_timeout: Duration,
    pub startup: StartupPolicy,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            consul_addr: "http://127.0.0.1:8500".to_string(),
            prefix: "test".to_string(),
            poll_interval: Duration::from_secs(3),
            wait: Some(Duration::from_secs(2)),
            request_timeout: Duration::from_secs(5),
            startup: StartupPolicy::Strict,
        }
    }
}

impl DirectoryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let wait_secs: u64 = std::env::var("CONSUL_WAIT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(2);

        Self {
            consul_addr: std::env::var("CONSUL_ADDR")
                .unwrap_or_else(|_| "http://127.0.0.1:8500".to_string()),
            prefix: std::env::var("CONSUL_PREFIX").unwrap_or_else(|_| "test".to_string()),
            poll_interval: Duration::from_secs(
                std::env::var("CONSUL_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3),
            ),
            wait: (wait_secs > 0).then(|| Duration::from_secs(wait_secs)),
            request_timeout: Duration::from_secs(5),
            startup: std::env::var("FLEET_STARTUP")
                .map(|s| StartupPolicy::parse(&s))
                .unwrap_or_default(),
        }
    }

    /// Client timeout: a blocking query may legitimately take `wait`.
    pub fn client_timeout(&self) -> Duration {
        self.request_timeout + self.wait.unwrap_or_default()
    }
}
