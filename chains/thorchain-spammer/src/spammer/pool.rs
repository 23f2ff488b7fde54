use super::spawn::spawn_spammer;
use super::{SpamContext, ThorSpammer, WorkerSettings};
use crate::config::ThorConfig;
use crate::error::RunError;
use anyhow::Result;
use core_logic::traits::{Keystore, Spammer, SpammerStats};
use core_logic::{SpamStats, WorkerRunner};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Periodic stats output while the pool runs.
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub interval: Duration,
    pub export_path: Option<String>,
}

/// The fixed set of workers for one run.
pub struct SpammerPool {
    spammers: Vec<ThorSpammer>,
    ctx: Arc<SpamContext>,
}

impl SpammerPool {
    /// Spawns one worker per keystore identity whose name starts with the
    /// configured prefix, in keystore order.
    ///
    /// Identities that cannot spawn are skipped, except for key decryption
    /// failures which abort the build. Each worker sends to the next one in
    /// the ring.
    pub async fn build(
        config: &ThorConfig,
        keystore: &dyn Keystore,
        ctx: Arc<SpamContext>,
    ) -> Result<Self, RunError> {
        let settings = Arc::new(WorkerSettings::from_config(config)?);
        let spam_config = config.to_spam_config();
        let password = spam_config.require_password()?;

        let identities = keystore.list_identities().await?;
        let total = identities.len();
        let candidates: Vec<_> = identities
            .into_iter()
            .filter(|id| id.name.starts_with(&config.spam_prefix))
            .collect();
        info!(
            "{} of {} keys match prefix '{}'",
            candidates.len(),
            total,
            config.spam_prefix
        );

        let mut spammers = Vec::with_capacity(candidates.len());
        for (index, identity) in candidates.iter().enumerate() {
            match spawn_spammer(
                index,
                identity,
                password,
                keystore,
                Arc::clone(&ctx),
                Arc::clone(&settings),
            )
            .await
            {
                Ok(spammer) => spammers.push(spammer),
                Err(e) if e.is_fatal() => {
                    error!("Cannot decrypt key '{}': {}", identity.name, e);
                    return Err(RunError::Spawn(e));
                }
                Err(e) => warn!("Skipping '{}': {}", identity.name, e),
            }
        }

        if spammers.is_empty() {
            return Err(RunError::EmptyPool {
                prefix: config.spam_prefix.clone(),
            });
        }

        link_ring(&mut spammers);
        info!("Pool ready with {} spammers", spammers.len());
        Ok(Self { spammers, ctx })
    }

    pub fn len(&self) -> usize {
        self.spammers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spammers.is_empty()
    }

    pub fn spammers(&self) -> &[ThorSpammer] {
        &self.spammers
    }

    /// Starts every worker and blocks until `token` is cancelled and all of
    /// them have stopped.
    pub async fn run(self, token: CancellationToken, report: StatsReport) -> Result<SpammerStats> {
        let reporter = spawn_stats_reporter(Arc::clone(&self.ctx.stats), report, token.clone());

        let workers: Vec<Box<dyn Spammer>> = self
            .spammers
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn Spammer>)
            .collect();
        let total = WorkerRunner::run_spammers(workers, token).await?;

        if let Err(e) = reporter.await {
            warn!("Stats reporter ended abnormally: {}", e);
        }
        self.ctx.stats.print();
        Ok(total)
    }
}

/// `pool[i]` sends to `pool[(i + 1) % n]`
fn link_ring(spammers: &mut [ThorSpammer]) {
    let addresses: Vec<String> = spammers.iter().map(|s| s.address().to_string()).collect();
    let n = addresses.len();
    for (i, spammer) in spammers.iter_mut().enumerate() {
        spammer.set_counterparty(addresses[(i + 1) % n].clone());
    }
}

fn spawn_stats_reporter(
    stats: Arc<SpamStats>,
    report: StatsReport,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if report.interval.is_zero() {
            return;
        }
        let mut ticker = interval_at(Instant::now() + report.interval, report.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            stats.print();
            if let Some(path) = &report.export_path {
                if let Err(e) = stats.export_to_file(path).await {
                    error!("Stats export to {} failed: {}", path, e);
                }
            }
        }

        if let Some(path) = &report.export_path {
            if let Err(e) = stats.export_to_file(path).await {
                error!("Final stats export to {} failed: {}", path, e);
            } else {
                info!("Stats exported to {}", path);
            }
        }
    })
}
