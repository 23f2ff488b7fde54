use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub timestamp: String,
    pub uptime_secs: u64,
    pub accounts: AccountStats,
    pub sends: SendStats,
    pub rpc: RpcStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountStats {
    pub not_found: u64,
    pub no_coins_to_send: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendStats {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
    pub resyncs: u64,
    pub success_rate: f64,
    pub per_second: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RpcStats {
    pub total_calls: u64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

/// Outcome counters shared by every worker of a run.
///
/// Each counter is an independent atomic, so increments never block and
/// are never lost. A snapshot reads every counter once; counters are only
/// ever incremented, so a snapshot is a consistent lower bound of the
/// current totals.
#[derive(Debug)]
pub struct SpamStats {
    accounts_not_found: AtomicU64,
    no_coins_to_send: AtomicU64,
    sends_success: AtomicU64,
    sends_failed: AtomicU64,
    resyncs: AtomicU64,
    rpc_calls: AtomicU64,
    rpc_latency_sum_ms: AtomicU64,
    rpc_min_latency_ms: AtomicU64,
    rpc_max_latency_ms: AtomicU64,
    start_time: Instant,
}

impl Default for SpamStats {
    fn default() -> Self {
        Self {
            accounts_not_found: AtomicU64::new(0),
            no_coins_to_send: AtomicU64::new(0),
            sends_success: AtomicU64::new(0),
            sends_failed: AtomicU64::new(0),
            resyncs: AtomicU64::new(0),
            rpc_calls: AtomicU64::new(0),
            rpc_latency_sum_ms: AtomicU64::new(0),
            rpc_min_latency_ms: AtomicU64::new(u64::MAX),
            rpc_max_latency_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }
}

impl SpamStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account_not_found(&self) {
        self.accounts_not_found.fetch_add(1, Ordering::SeqCst);
    }

    pub fn add_no_coins_to_send(&self) {
        self.no_coins_to_send.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_send(&self, success: bool) {
        if success {
            self.sends_success.fetch_add(1, Ordering::SeqCst);
        } else {
            self.sends_failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub fn record_resync(&self) {
        self.resyncs.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_rpc_latency(&self, latency: Duration) {
        let latency_ms = latency.as_millis() as u64;
        self.rpc_calls.fetch_add(1, Ordering::SeqCst);
        self.rpc_latency_sum_ms
            .fetch_add(latency_ms, Ordering::SeqCst);
        self.rpc_min_latency_ms
            .fetch_min(latency_ms, Ordering::SeqCst);
        self.rpc_max_latency_ms
            .fetch_max(latency_ms, Ordering::SeqCst);
    }

    pub fn accounts_not_found(&self) -> u64 {
        self.accounts_not_found.load(Ordering::SeqCst)
    }

    pub fn no_coins_to_send(&self) -> u64 {
        self.no_coins_to_send.load(Ordering::SeqCst)
    }

    pub fn sends_success(&self) -> u64 {
        self.sends_success.load(Ordering::SeqCst)
    }

    pub fn sends_failed(&self) -> u64 {
        self.sends_failed.load(Ordering::SeqCst)
    }

    pub fn resyncs(&self) -> u64 {
        self.resyncs.load(Ordering::SeqCst)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let success = self.sends_success();
        let failed = self.sends_failed();
        let total = success + failed;
        let uptime = self.uptime();

        let rpc_calls = self.rpc_calls.load(Ordering::SeqCst);
        let rpc_latency = self.rpc_latency_sum_ms.load(Ordering::SeqCst);
        let min_rpc = self.rpc_min_latency_ms.load(Ordering::SeqCst);

        StatsSnapshot {
            timestamp: Utc::now().to_rfc3339(),
            uptime_secs: uptime.as_secs(),
            accounts: AccountStats {
                not_found: self.accounts_not_found(),
                no_coins_to_send: self.no_coins_to_send(),
            },
            sends: SendStats {
                total,
                success,
                failed,
                resyncs: self.resyncs(),
                success_rate: if total > 0 {
                    success as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
                per_second: if uptime.as_secs_f64() > 0.0 {
                    success as f64 / uptime.as_secs_f64()
                } else {
                    0.0
                },
            },
            rpc: RpcStats {
                total_calls: rpc_calls,
                avg_latency_ms: if rpc_calls > 0 {
                    rpc_latency as f64 / rpc_calls as f64
                } else {
                    0.0
                },
                min_latency_ms: if min_rpc == u64::MAX { 0 } else { min_rpc },
                max_latency_ms: self.rpc_max_latency_ms.load(Ordering::SeqCst),
            },
        }
    }

    /// Logs a one-line summary under the `spam_stats` target.
    pub fn print(&self) {
        let s = self.snapshot();
        info!(
            target: "spam_stats",
            "Stats | up {}s | sent {} ({:.1}/s) | failed {} | resyncs {} | success rate {:.2}% | accounts not found {} | no coins {} | rpc avg {:.1}ms",
            s.uptime_secs,
            s.sends.success,
            s.sends.per_second,
            s.sends.failed,
            s.sends.resyncs,
            s.sends.success_rate,
            s.accounts.not_found,
            s.accounts.no_coins_to_send,
            s.rpc.avg_latency_ms
        );
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }

    pub async fn export_to_file(&self, path: &str) -> std::io::Result<()> {
        tokio::fs::write(path, self.to_json()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_counters_are_independent() {
        let stats = SpamStats::default();

        stats.add_account_not_found();
        stats.add_no_coins_to_send();
        stats.add_no_coins_to_send();
        stats.record_send(true);
        stats.record_send(true);
        stats.record_send(false);

        assert_eq!(stats.accounts_not_found(), 1);
        assert_eq!(stats.no_coins_to_send(), 2);
        assert_eq!(stats.sends_success(), 2);
        assert_eq!(stats.sends_failed(), 1);
        assert_eq!(stats.resyncs(), 0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.sends.total, 3);
        assert!((snapshot.sends.success_rate - 66.67).abs() < 0.1);
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let stats = Arc::new(SpamStats::default());
        let mut handles = Vec::new();

        for _ in 0..16 {
            let stats = Arc::clone(&stats);
            handles.push(tokio::spawn(async move {
                for i in 0..1000 {
                    stats.record_send(i % 4 != 0);
                    stats.add_account_not_found();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(stats.sends_success(), 16 * 750);
        assert_eq!(stats.sends_failed(), 16 * 250);
        assert_eq!(stats.accounts_not_found(), 16_000);
    }

    #[test]
    fn test_rpc_latency_bounds() {
        let stats = SpamStats::default();
        assert_eq!(stats.snapshot().rpc.min_latency_ms, 0);

        stats.record_rpc_latency(Duration::from_millis(40));
        stats.record_rpc_latency(Duration::from_millis(10));

        let rpc = stats.snapshot().rpc;
        assert_eq!(rpc.total_calls, 2);
        assert_eq!(rpc.min_latency_ms, 10);
        assert_eq!(rpc.max_latency_ms, 40);
        assert!((rpc.avg_latency_ms - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_export() {
        let stats = SpamStats::default();
        stats.record_resync();

        let json = stats.to_json();
        assert!(json.contains("\"resyncs\": 1"));
        assert!(json.contains("no_coins_to_send"));
    }
}
