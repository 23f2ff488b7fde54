//! # Core Logic - Shared Spam Engine Utilities
//!
//! Chain-agnostic building blocks used by every chain spammer in this
//! workspace.
//!
//! ## Modules
//!
//! - [`config`] - Run configuration and its validation
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Shared outcome counters for a spam run
//! - [`security`] - Password based key encryption
//! - [`traits`] - Worker and keystore traits
//!
//! The global [`RateLimiter`] and the single permit [`QueryGate`] are the
//! only primitives workers share besides [`SpamStats`].

pub mod config;
pub mod error;
pub mod metrics;
pub mod security;
pub mod traits;
pub(crate) mod utils;

pub use config::{ResyncPolicy, SpamConfig, DEFAULT_BLOCK_TIME_MS, DEFAULT_RESYNC_THRESHOLD};
pub use error::{ConfigError, NetworkError, SecurityError, WalletError};
pub use metrics::{SpamStats, StatsSnapshot};
pub use security::{EncryptedComponents, SecurityUtils};
pub use traits::{Identity, Keystore, Spammer, SpammerStats};

pub use utils::{
    setup_logger, shutdown_on_ctrl_c, DecryptedKey, LoggerConfig, QueryGate, RateLimiter,
    WalletManager, WorkerRunner,
};
