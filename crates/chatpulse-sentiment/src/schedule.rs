//! Fixed-cadence ticking bounded by a collection window.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Drives poll cycles every `interval` until `window` has elapsed.
///
/// The start instant is captured once on [`Schedule::start`] from tokio's
/// monotonic clock. Ticks are aligned to the start instant, so a slow
/// cycle shortens the following wait instead of pushing every later
/// cycle back.
#[derive(Debug)]
pub struct Schedule {
    started: Instant,
    window: Duration,
    interval: Duration,
    ticker: Interval,
}

impl Schedule {
    /// Start the clock. The first tick fires one `interval` after now.
    ///
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    #[must_use]
    pub fn start(interval: Duration, window: Duration) -> Self {
        let started = Instant::now();
        let mut ticker = tokio::time::interval_at(started + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            started,
            window,
            interval,
            ticker,
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `true` once the collection window has fully elapsed.
    #[must_use]
    pub fn window_closed(&self) -> bool {
        self.elapsed() >= self.window
    }

    /// Upper bound on cycles this schedule can run when cycles take no time.
    #[must_use]
    pub fn max_cycles(&self) -> u128 {
        self.window.as_nanos().div_ceil(self.interval.as_nanos())
    }

    /// Wait for the next cadence tick.
    pub async fn tick(&mut self) {
        self.ticker.tick().await;
    }
}
