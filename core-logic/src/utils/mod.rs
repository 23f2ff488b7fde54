//! # Utilities Module
//!
//! Internal utility modules for the core-logic crate.
//! These modules are marked as `pub(crate)` to enforce API boundaries.

pub(crate) mod logger;
pub(crate) mod query_gate;
pub(crate) mod rate_limiter;
pub(crate) mod runner;
pub(crate) mod wallet_manager;

// Selective exports - only public utilities
pub use logger::{setup_logger, LoggerConfig};
pub use query_gate::QueryGate;
pub use rate_limiter::RateLimiter;
pub use runner::{shutdown_on_ctrl_c, WorkerRunner};
pub use wallet_manager::{DecryptedKey, WalletManager};
