//! Fixed-period tick source driving the scheduler

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};

use crate::common::{Error, Result};

/// Fires once per period until stopped
///
/// The first tick fires one full period after [`TickClock::start`]. A tick
/// that could not be delivered on time (the handler ran long) is delayed
/// rather than followed by a burst of catch-up ticks.
#[derive(Debug)]
pub struct TickClock {
    interval: Option<Interval>,
    period: Duration,
    ticks: u64,
}

impl TickClock {
    /// Start ticking; must be called from within the tokio runtime
    pub fn start(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::Config(
                "tick period must be greater than zero".to_string(),
            ));
        }

        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(Self {
            interval: Some(interval),
            period,
            ticks: 0,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks delivered so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick and return its 1-based number
    ///
    /// Returns `None` once the clock is stopped.
    pub async fn tick(&mut self) -> Option<u64> {
        let interval = self.interval.as_mut()?;
        interval.tick().await;
        self.ticks += 1;
        Some(self.ticks)
    }

    /// Stop ticking; calling it again has no effect
    pub fn stop(&mut self) {
        if self.interval.take().is_some() {
            tracing::trace!(ticks = self.ticks, "Tick clock stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fire_once_per_period() {
        let start = Instant::now();
        let mut clock = TickClock::start(Duration::from_secs(1)).unwrap();

        assert_eq!(clock.tick().await, Some(1));
        assert_eq!(start.elapsed(), Duration::from_secs(1));

        assert_eq!(clock.tick().await, Some(2));
        assert_eq!(clock.tick().await, Some(3));
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(clock.ticks(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_handler_delays_next_tick() {
        let start = Instant::now();
        let mut clock = TickClock::start(Duration::from_secs(1)).unwrap();

        clock.tick().await;
        time::sleep(Duration::from_millis(2500)).await;

        // One delayed tick, not a burst of two missed ones
        assert_eq!(clock.tick().await, Some(2));
        assert_eq!(start.elapsed(), Duration::from_millis(3500));
        assert_eq!(clock.tick().await, Some(3));
        assert_eq!(start.elapsed(), Duration::from_millis(4500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let mut clock = TickClock::start(Duration::from_millis(10)).unwrap();
        assert_eq!(clock.tick().await, Some(1));

        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.tick().await, None);
        assert_eq!(clock.ticks(), 1);
    }

    #[tokio::test]
    async fn test_zero_period_is_rejected() {
        assert!(matches!(
            TickClock::start(Duration::ZERO),
            Err(Error::Config(_))
        ));
    }
}
