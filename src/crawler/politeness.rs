//! Global politeness gate
//!
//! Every outgoing request, from any worker, first waits for its turn at a
//! single shared gate. Consecutive requests are spaced by a random gap in
//! `[crawl_delay_min, crawl_delay_max]`, so the aggregate request rate stays
//! polite no matter how many workers are running.

use crate::config::FetchConfig;
use rand::Rng;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug)]
struct GateState {
    next_slot: Option<Instant>,
    min_delay: Duration,
    max_delay: Duration,
}

impl GateState {
    fn next_gap(&self) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }
}

/// Shared request spacing for the whole process
#[derive(Debug)]
pub struct PolitenessGate {
    state: Mutex<GateState>,
}

impl PolitenessGate {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            state: Mutex::new(GateState {
                next_slot: None,
                min_delay,
                max_delay: max_delay.max(min_delay),
            }),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.crawl_delay_min),
            Duration::from_secs_f64(config.crawl_delay_max),
        )
    }

    /// A gate that never waits (tests and offline tools)
    pub fn unthrottled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Waits until the caller may send its request, then books the next slot
    ///
    /// The lock is held while sleeping, so callers are released one at a
    /// time in arrival order.
    pub async fn wait_turn(&self) {
        let mut state = self.state.lock().await;
        if let Some(slot) = state.next_slot {
            tokio::time::sleep_until(slot).await;
        }
        let gap = state.next_gap();
        state.next_slot = Some(Instant::now() + gap);
    }

    /// Raises the minimum spacing, e.g. to honour a robots.txt `Crawl-delay`
    pub async fn raise_floor(&self, delay: Duration) {
        let mut state = self.state.lock().await;
        if delay > state.min_delay {
            tracing::info!(
                "Raising minimum request spacing from {:?} to {:?}",
                state.min_delay,
                delay
            );
            state.min_delay = delay;
            state.max_delay = state.max_delay.max(delay);
        }
    }

    pub async fn bounds(&self) -> (Duration, Duration) {
        let state = self.state.lock().await;
        (state.min_delay, state.max_delay)
    }
}
