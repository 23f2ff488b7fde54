//! THORChain Spammer - transaction load generator for a THORChain node
//!
//! Keeps a pool of funded accounts that submit bank transfers and
//! liquidity-pool trades at a globally throttled rate, resyncing each
//! account's sequence number whenever a submission fails.
//!
//! # Architecture
//!
//! - **[`SpammerPool`]**: discovers keys by name prefix, spawns one worker
//!   per funded account and links them in a ring
//! - **[`ThorSpammer`]**: the per-account send/resync loop
//! - **[`ChainClient`]**: account queries and submissions, with
//!   [`RestClient`] talking to the node's REST API
//! - **[`TxSigner`]**: secp256k1 signing of amino-JSON transactions
//!
//! The rate limiter, query gate and stats collector come from `core_logic`.
//!
//! # Quick Start
//!
//! ```bash
//! WALLET_PASSWORD=... cargo run -p thorchain-spammer -- --chain-id thorchain
//! ```

pub mod client;
pub mod coins;
pub mod config;
pub mod error;
pub mod msgs;
pub mod spammer;
pub mod tx;

pub use client::{AccountState, ChainClient, RestClient, TxReceipt};
pub use coins::Coin;
pub use config::ThorConfig;
pub use error::{RunError, SendError, SpawnError};
pub use msgs::Msg;
pub use spammer::pool::{SpammerPool, StatsReport};
pub use spammer::spawn::spawn_spammer;
pub use spammer::{SpamContext, ThorSpammer, WorkerSettings, WorkerState};
pub use tx::{StdTx, TxSigner};
