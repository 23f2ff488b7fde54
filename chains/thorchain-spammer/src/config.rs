use anyhow::{Context, Result};
use config::{Config, Environment, File};
use core_logic::config::{ResyncPolicy, SpamConfig};
use core_logic::{ConfigError, DEFAULT_BLOCK_TIME_MS, DEFAULT_RESYNC_THRESHOLD};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ThorConfig {
    #[serde(default = "default_node_url")]
    pub node_url: String,
    #[serde(default)]
    pub chain_id: Option<String>,
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_spam_prefix")]
    pub spam_prefix: String,
    #[serde(default)]
    pub spam_password: Option<String>,
    #[serde(default = "default_keystore_dir")]
    pub keystore_dir: String,
    #[serde(default = "default_resync_threshold")]
    pub resync_threshold: u64,
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,
    /// Each spammer sends at most `balance / divide_by` of every denom
    #[serde(default = "default_divide_by")]
    pub divide_by: i64,
    #[serde(default = "default_clp_from")]
    pub clp_from: String,
    #[serde(default = "default_clp_to")]
    pub clp_to: String,
    #[serde(default = "default_gas")]
    pub gas: u64,
    #[serde(default)]
    pub memo: String,
    #[serde(default = "default_stats_interval_secs")]
    pub stats_interval_secs: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_node_url() -> String {
    "http://localhost:1317".to_string()
}

fn default_rate_limit_ms() -> u64 {
    100
}

fn default_spam_prefix() -> String {
    "spam".to_string()
}

fn default_keystore_dir() -> String {
    "keystore".to_string()
}

fn default_resync_threshold() -> u64 {
    DEFAULT_RESYNC_THRESHOLD
}

fn default_block_time_ms() -> u64 {
    DEFAULT_BLOCK_TIME_MS
}

fn default_divide_by() -> i64 {
    1000
}

fn default_clp_from() -> String {
    "RUNE".to_string()
}

fn default_clp_to() -> String {
    "ETH".to_string()
}

fn default_gas() -> u64 {
    200_000
}

fn default_stats_interval_secs() -> u64 {
    10
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for ThorConfig {
    fn default() -> Self {
        Self {
            node_url: default_node_url(),
            chain_id: None,
            rate_limit_ms: default_rate_limit_ms(),
            spam_prefix: default_spam_prefix(),
            spam_password: None,
            keystore_dir: default_keystore_dir(),
            resync_threshold: default_resync_threshold(),
            block_time_ms: default_block_time_ms(),
            divide_by: default_divide_by(),
            clp_from: default_clp_from(),
            clp_to: default_clp_to(),
            gas: default_gas(),
            memo: String::new(),
            stats_interval_secs: default_stats_interval_secs(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl ThorConfig {
    /// Reads `path` if it exists, then lets `THORSPAM_*` variables override it.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("THORSPAM"))
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to parse thorchain-spammer config")
    }

    pub fn to_spam_config(&self) -> SpamConfig {
        SpamConfig {
            node_url: self.node_url.clone(),
            chain_id: self.chain_id.clone(),
            rate_limit_ms: self.rate_limit_ms,
            spam_prefix: self.spam_prefix.clone(),
            spam_password: self.spam_password.clone(),
            keystore_dir: self.keystore_dir.clone(),
            resync: ResyncPolicy {
                threshold: self.resync_threshold,
                block_time_ms: self.block_time_ms,
            },
            stats_interval_secs: self.stats_interval_secs,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_spam_config().validate()?;
        if self.divide_by <= 0 {
            return Err(ConfigError::invalid(
                "divide_by",
                "divisor must be a positive integer",
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
