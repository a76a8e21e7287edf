// Transport configuration read from environment variables
use dis_core::DEFAULT_TCP_TIMEOUT_SECS;
use std::env;
use std::time::Duration;

// DIS_TCP_TIMEOUT: seconds every readiness wait may block (default: 30)
// DIS_REPLY_TIMEOUT: seconds one reply write may take in total (default: 10)
const ENV_TCP_TIMEOUT: &str = "DIS_TCP_TIMEOUT";
const ENV_REPLY_TIMEOUT: &str = "DIS_REPLY_TIMEOUT";

pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub timeout_secs: u64,
    pub reply_timeout_secs: u64,
}

impl TransportConfig {
    pub fn from_env() -> Self {
        TransportConfig::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout_secs = lookup(ENV_TCP_TIMEOUT)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_TCP_TIMEOUT_SECS);

        let reply_timeout_secs = lookup(ENV_REPLY_TIMEOUT)
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_REPLY_TIMEOUT_SECS);

        TransportConfig {
            timeout_secs,
            reply_timeout_secs,
        }
    }

    pub fn reply_budget(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            timeout_secs: DEFAULT_TCP_TIMEOUT_SECS,
            reply_timeout_secs: DEFAULT_REPLY_TIMEOUT_SECS,
        }
    }
}
