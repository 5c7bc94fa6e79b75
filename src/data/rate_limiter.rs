//! Rolling-window rate limiter for the market data provider
//!
//! Alpha Vantage's free tier allows 5 requests per minute. Every outbound
//! request reserves a slot first; when the window is full the caller is
//! suspended until the oldest request ages out.

use std::collections::VecDeque;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{DataError, DataResult};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests allowed inside one window
    pub max_requests: usize,

    /// Length of the rolling window
    pub window: Duration,

    /// Extra wait added on top of the computed delay
    pub safety_margin: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window: Duration::from_secs(60),
            safety_margin: Duration::from_millis(1000),
        }
    }
}

/// Sliding-window limiter shared by all call sites through an `Arc`.
///
/// `turn` is held by one reservation across its wait, so check-and-record is
/// atomic and concurrent reservations are granted in FIFO order. `history` is
/// only locked for a prune and read, so the accessors never queue behind a
/// sleeping reservation.
pub struct RateLimiter {
    config: RateLimitConfig,
    turn: Mutex<()>,
    history: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// A quota of zero would never grant a slot; it is raised to one.
    pub fn new(mut config: RateLimitConfig) -> Self {
        if config.max_requests == 0 {
            tracing::warn!("Rate limit max_requests of 0 raised to 1");
            config.max_requests = 1;
        }
        Self {
            turn: Mutex::new(()),
            history: Mutex::new(VecDeque::with_capacity(config.max_requests)),
            config,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Reserve a call slot, waiting as long as the window requires
    pub async fn reserve(&self) {
        let _turn = self.turn.lock().await;

        loop {
            let (wait, in_window) = {
                let mut history = self.history.lock().await;
                let now = Instant::now();
                self.prune(&mut history, now);

                let wait = self.wait_for(&history, now);
                if wait.is_zero() {
                    history.push_back(now);
                    return;
                }
                (wait, history.len())
            };

            tracing::info!(
                in_window,
                max_requests = self.config.max_requests,
                "Rate limit reached. Waiting {}ms",
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Like [`reserve`](Self::reserve), but gives up when `cancel` resolves first.
    ///
    /// No slot is recorded for a cancelled reservation.
    pub async fn reserve_or_cancel<F>(&self, cancel: F) -> DataResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                tracing::debug!("Rate limiter reservation cancelled");
                Err(DataError::Cancelled)
            }
            _ = self.reserve() => Ok(()),
        }
    }

    /// Number of requests recorded inside the current window
    pub async fn in_flight(&self) -> usize {
        let mut history = self.history.lock().await;
        self.prune(&mut history, Instant::now());
        history.len()
    }

    /// Wait a reservation made right now would incur
    pub async fn time_until_slot(&self) -> Duration {
        let mut history = self.history.lock().await;
        let now = Instant::now();
        self.prune(&mut history, now);
        self.wait_for(&history, now)
    }

    fn prune(&self, history: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = history.front() {
            if now.duration_since(oldest) >= self.config.window {
                history.pop_front();
            } else {
                break;
            }
        }
    }

    fn wait_for(&self, history: &VecDeque<Instant>, now: Instant) -> Duration {
        if history.len() < self.config.max_requests {
            return Duration::ZERO;
        }
        match history.front() {
            Some(&oldest) => {
                (oldest + self.config.window).saturating_duration_since(now) + self.config.safety_margin
            }
            None => Duration::ZERO,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}
