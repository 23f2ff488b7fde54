use core_logic::{ConfigError, NetworkError, WalletError};
use thiserror::Error;

/// Why an identity did not make it into the pool.
#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("account '{name}' not found on chain: {reason}")]
    AccountNotFound { name: String, reason: String },

    #[error("account '{name}' has no coins to send")]
    NoSendableCoins { name: String },

    #[error(transparent)]
    Decryption(#[from] WalletError),
}

impl SpawnError {
    /// Only a key that cannot be decrypted stops the whole run; the other
    /// reasons just leave the identity out.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SpawnError::Decryption(_))
    }
}

/// Anything that went wrong between a pulse and an accepted submission.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encoding failed: {0}")]
    Encoding(String),

    #[error(transparent)]
    Submit(#[from] NetworkError),
}

/// Startup failures. None of them can happen once workers are running.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Keystore(#[from] WalletError),

    #[error("spawn aborted: {0}")]
    Spawn(SpawnError),

    #[error("no spammer could be started for prefix '{prefix}'")]
    EmptyPool { prefix: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_decryption_is_fatal() {
        let not_found = SpawnError::AccountNotFound {
            name: "spam1".into(),
            reason: "404".into(),
        };
        let no_coins = SpawnError::NoSendableCoins {
            name: "spam1".into(),
        };
        let decrypt = SpawnError::from(WalletError::DecryptionFailed {
            name: "spam1".into(),
            reason: "bad tag".into(),
        });

        assert!(!not_found.is_fatal());
        assert!(!no_coins.is_fatal());
        assert!(decrypt.is_fatal());
    }
}
