use crate::traits::{Spammer, SpammerStats};
use anyhow::Result;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Spawns one task per spammer and waits for all of them.
    ///
    /// Workers only return once `token` is cancelled, so without a
    /// cancellation this call never completes.
    pub async fn run_spammers(
        spammers: Vec<Box<dyn Spammer>>,
        token: CancellationToken,
    ) -> Result<SpammerStats> {
        let mut set = JoinSet::new();

        let start_time = std::time::Instant::now();
        info!("Starting {} spammer workers...", spammers.len());

        for (i, mut spammer) in spammers.into_iter().enumerate() {
            let span = tracing::info_span!(
                "worker",
                worker_id = %format!("{:03}", i),
                account = %spammer.label()
            );
            let child_token = token.clone();

            set.spawn(
                async move {
                    info!("Started");
                    match spammer.start(child_token).await {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!("Worker {} failed: {:?}", i, e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut total = SpammerStats::default();

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(stats)) => total.merge(&stats),
                Ok(Err(_)) => {
                    // Already logged in the worker span
                }
                Err(e) => {
                    error!("A worker task panicked or failed to join: {:?}", e);
                }
            }
        }

        let attempts = total.success + total.failed;
        let rate = if attempts > 0 {
            (total.success as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };

        info!("🛑 Shutdown Complete.");
        info!(
            "Total Time: {:.1}s | Total Success: {} | Total Fail: {} | Resyncs: {} | Success Rate: {:.2}%",
            start_time.elapsed().as_secs_f64(),
            total.success,
            total.failed,
            total.resyncs,
            rate
        );

        Ok(total)
    }
}

/// Cancels `token` on the first Ctrl+C.
pub fn shutdown_on_ctrl_c(token: CancellationToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("🛑 Received Ctrl+C. Initiating graceful shutdown...");
                token.cancel();
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });
}
