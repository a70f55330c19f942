//! Pacing of reconciliation work

use std::time::Duration;

/// Delays between operations and between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// After every parameter read/write
    pub parameter_delay: Duration,
    /// After every fixed-parameter node
    pub node_delay: Duration,
    /// Between ticks when the last tick had failures
    pub retry_interval: Duration,
    /// Between ticks when the last tick was clean
    pub idle_interval: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            parameter_delay: Duration::from_secs(2),
            node_delay: Duration::from_secs(10),
            retry_interval: Duration::from_secs(10),
            idle_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl Pacing {
    /// No delays at all
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            parameter_delay: Duration::ZERO,
            node_delay: Duration::ZERO,
            retry_interval: Duration::ZERO,
            idle_interval: Duration::ZERO,
        }
    }

    /// How long to wait before the next tick
    #[must_use]
    pub fn after_tick(&self, had_failures: bool) -> Duration {
        if had_failures {
            self.retry_interval
        } else {
            self.idle_interval
        }
    }
}

/// Sleep unless the delay is zero
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pacing = Pacing::default();
        assert_eq!(pacing.parameter_delay, Duration::from_secs(2));
        assert_eq!(pacing.node_delay, Duration::from_secs(10));
        assert_eq!(pacing.after_tick(true), Duration::from_secs(10));
        assert_eq!(pacing.after_tick(false), Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_waits_for_delay() {
        let start = tokio::time::Instant::now();
        pause(Duration::from_secs(2)).await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
