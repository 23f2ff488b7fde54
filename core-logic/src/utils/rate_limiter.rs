//! # Core Logic - Global Rate Limiter
//!
//! One periodic pulse source shared by every worker of a run. A worker must
//! consume a pulse before each submission, so the configured period caps the
//! aggregate submission rate of the whole pool rather than the rate of any
//! single worker. Workers that are ready at the same time race for the next
//! pulse; no ordering between them is promised.

use crate::error::ConfigError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::{interval_at, Interval, MissedTickBehavior};
use tracing::debug;

#[derive(Debug)]
pub struct RateLimiter {
    ticker: Mutex<Interval>,
    period: Duration,
    pulses: AtomicU64,
}

impl RateLimiter {
    /// Creates a limiter whose first pulse fires one `period` from now.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(period: Duration) -> Result<Self, ConfigError> {
        if period.is_zero() {
            return Err(ConfigError::invalid(
                "rate_limit_ms",
                "interval between submissions must be positive",
            ));
        }

        let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
        // A stalled pool gets one pulse back, never a burst of missed ones.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!("Rate limiter created with period {:?}", period);
        Ok(Self {
            ticker: Mutex::new(ticker),
            period,
            pulses: AtomicU64::new(0),
        })
    }

    pub fn from_millis(ms: u64) -> Result<Self, ConfigError> {
        Self::new(Duration::from_millis(ms))
    }

    /// Waits for the next pulse. Each pulse is handed to exactly one caller.
    ///
    /// Cancel-safe: dropping the future before it completes consumes nothing.
    pub async fn pulse(&self) -> Instant {
        let mut ticker = self.ticker.lock().await;
        let at = ticker.tick().await;
        self.pulses.fetch_add(1, Ordering::SeqCst);
        at.into_std()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Pulses handed out so far
    pub fn pulses(&self) -> u64 {
        self.pulses.load(Ordering::SeqCst)
    }
}
