//! Tick sources pacing the progress loop.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Interval;

/// Decides when the driver checks on its jobs next.
#[async_trait]
pub trait TickSource: Send {
    /// Waits until the next progress check is due.
    async fn tick(&mut self);
}

/// Sleeps a fixed delay before every check.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl TickSource for FixedDelay {
    async fn tick(&mut self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Fixed-rate timer, for callers that already run a `tokio` interval.
#[async_trait]
impl TickSource for Interval {
    async fn tick(&mut self) {
        Interval::tick(self).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_fixed_delay_sleeps() {
        let mut ticker = FixedDelay::new(Duration::from_millis(20));
        let start = Instant::now();
        ticker.tick().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_interval_as_tick_source() {
        let mut interval = tokio::time::interval(Duration::from_millis(5));
        let ticker: &mut dyn TickSource = &mut interval;
        // First tick of a tokio interval completes immediately.
        ticker.tick().await;
        ticker.tick().await;
    }
}
