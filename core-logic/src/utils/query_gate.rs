//! Single permit guarding chain state queries.
//!
//! Balance and sequence lookups go through [`QueryGate::run`], so at most one
//! of them is in flight across the whole process. Submissions never take the
//! permit.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug, Default)]
pub struct QueryGate {
    permit: Mutex<()>,
    completed: AtomicU64,
}

impl QueryGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the permit, run `query`, release the permit.
    ///
    /// Waiters are blocked on the permit, not spinning. The permit is released
    /// even if the returned future is dropped mid-query.
    pub async fn run<F, Fut, T>(&self, query: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _held = self.permit.lock().await;
        trace!("query gate acquired");
        let out = query().await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        out
    }

    /// True when nobody holds the permit right now.
    pub fn is_free(&self) -> bool {
        self.permit.try_lock().is_ok()
    }

    /// Number of queries that ran to completion through the gate
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_at_most_one_query_in_flight() {
        let gate = Arc::new(QueryGate::new());
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let gate = Arc::clone(&gate);
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(tokio::spawn(async move {
                gate.run(|| async {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .await
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(gate.completed(), 10);
        assert!(gate.is_free());
    }

    #[tokio::test(start_paused = true)]
    async fn test_permit_released_when_query_is_dropped() {
        let gate = QueryGate::new();
        let slow = gate.run(|| tokio::time::sleep(Duration::from_secs(60)));
        let _ = tokio::time::timeout(Duration::from_millis(10), slow).await;

        assert!(gate.is_free());
        assert_eq!(gate.run(|| async { 7 }).await, 7);
    }
}
