//! # Core Error Types
//!
//! Centralized error definitions for the core-logic crate.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use thiserror::Error;

/// Configuration-related errors. All of them abort a run before any worker starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn missing(field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Keystore and key material errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Decryption failed for key '{name}': {reason}")]
    DecryptionFailed { name: String, reason: String },

    #[error("No key named '{name}' in keystore (total keys: {total})")]
    NotFound { name: String, total: usize },

    #[error("Invalid private key format: expected hex string")]
    InvalidKeyFormat,

    #[error("Private key has wrong length: expected 64 hex chars, got {length}")]
    InvalidKeyLength { length: usize },

    #[error("Malformed key file {path}: {reason}")]
    MalformedKeystore { path: String, reason: String },

    #[error("Keystore at {path} is unavailable: {reason}")]
    KeystoreUnavailable { path: String, reason: String },
}

/// Network and chain query/broadcast errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("No account with address {address} was found in the chain state")]
    AccountNotFound { address: String },

    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Transaction rejected with code {code}: {log}")]
    SubmitRejected { code: u32, log: String },

    #[error("Transport error talking to {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },
}

/// Security-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    #[error("Password required but not provided")]
    PasswordRequired,

    #[error("Encryption/decryption failed: {reason}")]
    CryptographyFailed { reason: String },
}
