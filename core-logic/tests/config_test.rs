use core_logic::config::{ResyncPolicy, SpamConfig};
use core_logic::ConfigError;
use std::time::Duration;

fn base_config() -> SpamConfig {
    SpamConfig {
        node_url: "http://localhost:1317".to_string(),
        chain_id: Some("thorchain".to_string()),
        rate_limit_ms: 100,
        spam_prefix: "spam".to_string(),
        spam_password: Some("hunter2".to_string()),
        keystore_dir: "keystore".to_string(),
        resync: ResyncPolicy::default(),
        stats_interval_secs: 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = base_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.require_chain_id().unwrap(), "thorchain");
        assert_eq!(config.rate_limit(), Duration::from_millis(100));
    }

    #[test]
    fn test_missing_chain_id() {
        let mut config = base_config();
        config.chain_id = None;
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::MissingField {
                field: "chain_id".to_string()
            }
        );

        config.chain_id = Some("   ".to_string());
        assert!(config.require_chain_id().is_err());
    }

    #[test]
    fn test_missing_password() {
        let mut config = base_config();
        config.spam_password = Some(String::new());
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::MissingField {
                field: "spam_password".to_string()
            }
        );
    }

    #[test]
    fn test_zero_rate_limit_rejected() {
        let mut config = base_config();
        config.rate_limit_ms = 0;
        match config.validate().unwrap_err() {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "rate_limit_ms"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_resync_defaults() {
        let policy = ResyncPolicy::default();
        assert_eq!(policy.threshold, 50_000);
        assert_eq!(policy.block_time(), Duration::from_millis(8000));

        let mut config = base_config();
        config.resync.threshold = 0;
        assert!(config.validate().is_err());
    }
}
