use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_RESYNC_THRESHOLD: u64 = 50_000;
pub const DEFAULT_BLOCK_TIME_MS: u64 = 8000;

/// Chain-agnostic settings every spam run needs.
///
/// Chain crates load their own config files and convert them into this
/// struct; [`SpamConfig::validate`] is the single place where startup
/// parameters are checked before any worker is started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamConfig {
    pub node_url: String,
    pub chain_id: Option<String>,
    /// Milliseconds between two rate limiter pulses, for the whole pool.
    pub rate_limit_ms: u64,
    pub spam_prefix: String,
    pub spam_password: Option<String>,
    pub keystore_dir: String,
    pub resync: ResyncPolicy,
    pub stats_interval_secs: u64,
}

/// When and how a worker re-reads its sequence number from the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResyncPolicy {
    /// Successful sends after which a resync happens even without failures.
    pub threshold: u64,
    /// Sleep before querying, long enough for one block to be committed.
    pub block_time_ms: u64,
}

impl Default for ResyncPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RESYNC_THRESHOLD,
            block_time_ms: DEFAULT_BLOCK_TIME_MS,
        }
    }
}

impl ResyncPolicy {
    pub fn block_time(&self) -> Duration {
        Duration::from_millis(self.block_time_ms)
    }
}

impl SpamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.require_chain_id()?;
        self.require_password()?;

        if self.rate_limit_ms == 0 {
            return Err(ConfigError::invalid(
                "rate_limit_ms",
                "interval between submissions must be positive",
            ));
        }
        if self.resync.threshold == 0 {
            return Err(ConfigError::invalid(
                "resync_threshold",
                "threshold must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn require_chain_id(&self) -> Result<&str, ConfigError> {
        match self.chain_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(ConfigError::missing("chain_id")),
        }
    }

    pub fn require_password(&self) -> Result<&str, ConfigError> {
        match self.spam_password.as_deref() {
            Some(pw) if !pw.is_empty() => Ok(pw),
            _ => Err(ConfigError::missing("spam_password")),
        }
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}
