//! The per-account worker.
//!
//! A [`ThorSpammer`] alternates between two states. In `Sending` it waits for
//! a pulse from the shared rate limiter, signs one message with its local
//! sequence and submits it. A failed submission, or reaching the resync
//! threshold, moves it to `Resyncing`: sleep one block, take the query gate,
//! read the authoritative sequence from the chain, then go back to sending.

pub mod pool;
pub mod spawn;

use crate::client::{ChainClient, TxReceipt};
use crate::coins::{format_coins, Coin};
use crate::config::ThorConfig;
use crate::error::SendError;
use crate::msgs::{build_send, build_trade, Msg};
use crate::tx::{SignMeta, StdFee, TxSigner};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::config::ResyncPolicy;
use core_logic::traits::{Spammer, SpammerStats};
use core_logic::{ConfigError, QueryGate, RateLimiter, SpamStats};
use rand::Rng;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What every worker of a run shares.
pub struct SpamContext {
    pub client: Arc<dyn ChainClient>,
    pub limiter: Arc<RateLimiter>,
    pub gate: Arc<QueryGate>,
    pub stats: Arc<SpamStats>,
}

impl SpamContext {
    pub fn new(client: Arc<dyn ChainClient>, limiter: RateLimiter, stats: Arc<SpamStats>) -> Self {
        Self {
            client,
            limiter: Arc::new(limiter),
            gate: Arc::new(QueryGate::new()),
            stats,
        }
    }
}

/// Immutable per-run settings handed to each worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub chain_id: String,
    pub resync: ResyncPolicy,
    pub divide_by: i64,
    pub fee: StdFee,
    pub memo: String,
    pub clp_from: String,
    pub clp_to: String,
}

impl WorkerSettings {
    pub fn from_config(config: &ThorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let spam = config.to_spam_config();

        Ok(Self {
            chain_id: spam.require_chain_id()?.to_string(),
            resync: spam.resync,
            divide_by: config.divide_by,
            fee: StdFee::gas_only(config.gas),
            memo: config.memo.clone(),
            clp_from: config.clp_from.clone(),
            clp_to: config.clp_to.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Sending,
    Resyncing,
}

pub struct ThorSpammer {
    index: usize,
    name: String,
    address: String,
    signer: TxSigner,
    account_number: u64,
    sequence: i64,
    send_coins: Vec<Coin>,
    resync_counter: u64,
    counterparty: String,
    clp_from: String,
    clp_to: String,
    ctx: Arc<SpamContext>,
    settings: Arc<WorkerSettings>,
    stats: SpammerStats,
}

impl ThorSpammer {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        index: usize,
        name: String,
        address: String,
        signer: TxSigner,
        account_number: u64,
        sequence: i64,
        send_coins: Vec<Coin>,
        ctx: Arc<SpamContext>,
        settings: Arc<WorkerSettings>,
    ) -> Self {
        Self {
            index,
            counterparty: address.clone(),
            clp_from: settings.clp_from.clone(),
            clp_to: settings.clp_to.clone(),
            name,
            address,
            signer,
            account_number,
            sequence,
            send_coins,
            resync_counter: 0,
            ctx,
            settings,
            stats: SpammerStats::default(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    pub fn send_coins(&self) -> &[Coin] {
        &self.send_coins
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn resync_counter(&self) -> u64 {
        self.resync_counter
    }

    pub fn stats(&self) -> &SpammerStats {
        &self.stats
    }

    pub(crate) fn set_counterparty(&mut self, address: String) {
        self.counterparty = address;
    }

    /// A trade between the current ticker pair, or a transfer of the send
    /// slice to the counterparty. Building a trade swaps the pair.
    fn build_msg(&mut self, use_trade: bool) -> Msg {
        if use_trade {
            let msg = build_trade(&self.address, &self.clp_from, &self.clp_to);
            std::mem::swap(&mut self.clp_from, &mut self.clp_to);
            msg
        } else {
            build_send(&self.address, &self.counterparty, &self.send_coins)
        }
    }

    pub async fn send_once(&mut self, use_trade: bool) -> Result<TxReceipt, SendError> {
        let msg = self.build_msg(use_trade);
        debug!(
            "Sending {} with sequence {} ({})",
            msg.kind(),
            self.sequence,
            format_coins(&self.send_coins)
        );

        let meta = SignMeta {
            chain_id: &self.settings.chain_id,
            account_number: self.account_number,
            sequence: self.sequence,
            fee: &self.settings.fee,
            memo: &self.settings.memo,
        };
        let tx = self.signer.sign(vec![msg], &meta)?;
        Ok(self.ctx.client.submit(&tx).await?)
    }

    /// Applies the outcome of one submission and picks the next state.
    pub fn after_send(&mut self, result: Result<TxReceipt, SendError>) -> WorkerState {
        match result {
            Ok(receipt) => {
                info!("SUCCESS seq={} hash={}", self.sequence, receipt.hash);
                self.sequence += 1;
                self.resync_counter += 1;
                self.stats.success += 1;
                self.ctx.stats.record_send(true);

                if self.resync_counter >= self.settings.resync.threshold {
                    info!(
                        "{} sends since last resync, refreshing sequence",
                        self.resync_counter
                    );
                    WorkerState::Resyncing
                } else {
                    WorkerState::Sending
                }
            }
            Err(e) => {
                warn!("FAILED seq={}: {}", self.sequence, e);
                self.stats.failed += 1;
                self.ctx.stats.record_send(false);
                WorkerState::Resyncing
            }
        }
    }

    /// Waits one block, then overwrites the local sequence with the chain's.
    ///
    /// Returns `false` when cancelled before the query completed.
    pub async fn resync(&mut self, token: &CancellationToken) -> bool {
        let block_time = self.settings.resync.block_time();
        info!("Time to refresh sequence, waiting {:?} for next block", block_time);

        tokio::select! {
            biased;
            _ = token.cancelled() => return false,
            _ = tokio::time::sleep(block_time) => {}
        }

        let ctx = Arc::clone(&self.ctx);
        let address = self.address.as_str();
        let queried = tokio::select! {
            biased;
            _ = token.cancelled() => return false,
            res = ctx.gate.run(|| ctx.client.get_account(address)) => res,
        };

        match queried {
            Ok(account) => {
                debug!("Sequence {} -> {}", self.sequence, account.sequence);
                self.sequence = account.sequence;
            }
            Err(e) => {
                // Keep the local value; the next failure brings us back here
                warn!("Sequence query failed, keeping {}: {}", self.sequence, e);
            }
        }

        self.resync_counter = 0;
        self.stats.resyncs += 1;
        self.ctx.stats.record_resync();
        info!("Sequence updated to {}", self.sequence);
        true
    }
}

fn coin_flip() -> bool {
    rand::thread_rng().gen_bool(0.5)
}

#[async_trait]
impl Spammer for ThorSpammer {
    fn label(&self) -> &str {
        &self.name
    }

    async fn start(&mut self, cancellation_token: CancellationToken) -> Result<SpammerStats> {
        loop {
            tokio::select! {
                biased;
                _ = cancellation_token.cancelled() => break,
                _ = self.ctx.limiter.pulse() => {}
            }

            let use_trade = coin_flip();
            let result = self.send_once(use_trade).await;

            if self.after_send(result) == WorkerState::Resyncing
                && !self.resync(&cancellation_token).await
            {
                break;
            }
        }

        info!("Worker stopping (cancelled).");
        Ok(self.stats.clone())
    }
}
