//! Adaptive inter-send delay, owned by the publish runner.

use std::time::Duration;

/// A single mutable scalar: how long to wait between successive sends.
///
/// Halved on success, doubled on failure or rate limit, always clamped to
/// `[floor, ceiling]`. Lives only for the duration of one runner.
#[derive(Debug, Clone)]
pub struct AdaptiveDelay {
    current: Duration,
    floor: Duration,
    ceiling: Duration,
}

impl Default for AdaptiveDelay {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(2),
            Duration::from_secs(1),
            Duration::from_secs(10),
        )
    }
}

impl AdaptiveDelay {
    #[must_use]
    pub fn new(initial: Duration, floor: Duration, ceiling: Duration) -> Self {
        let ceiling = ceiling.max(floor);
        Self {
            current: initial.clamp(floor, ceiling),
            floor,
            ceiling,
        }
    }

    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Multiplicative decrease, bounded below by the floor.
    pub fn on_success(&mut self) {
        self.current = (self.current / 2).max(self.floor);
    }

    /// Multiplicative increase, bounded above by the ceiling.
    pub fn on_failure(&mut self) {
        self.current = (self.current * 2).min(self.ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_decreases_down_to_floor() {
        let mut delay = AdaptiveDelay::default();
        let before = delay.current();
        delay.on_success();
        assert!(delay.current() <= before);
        for _ in 0..10 {
            delay.on_success();
        }
        assert_eq!(delay.current(), Duration::from_secs(1));
    }

    #[test]
    fn failure_increases_up_to_ceiling() {
        let mut delay = AdaptiveDelay::default();
        let before = delay.current();
        delay.on_failure();
        assert!(delay.current() >= before);
        for _ in 0..10 {
            delay.on_failure();
        }
        assert_eq!(delay.current(), Duration::from_secs(10));
    }

    #[test]
    fn initial_is_clamped() {
        let delay = AdaptiveDelay::new(
            Duration::from_secs(60),
            Duration::from_secs(1),
            Duration::from_secs(10),
        );
        assert_eq!(delay.current(), Duration::from_secs(10));
    }
}
