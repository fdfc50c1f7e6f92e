//! # Fibonacci Backoff
//!
//! Retry delays for Applications whose reconciliation failed.
//!
//! Delays grow along the Fibonacci sequence in whole minutes, starting at the
//! configured floor and capped at the configured ceiling. With the defaults
//! (1 and 10 minutes): 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...
//!
//! ```rust
//! use app_secrets_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 60);
//! assert_eq!(backoff.next_backoff_seconds(), 120);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FibonacciBackoff {
    min_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
    max_minutes: u64,
}

impl FibonacciBackoff {
    /// Create a backoff between `min_minutes` and `max_minutes`
    ///
    /// A floor of zero is raised to one minute and a ceiling below the floor
    /// is raised to the floor.
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        let min_minutes = min_minutes.max(1);
        Self {
            min_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
            max_minutes: max_minutes.max(min_minutes),
        }
    }

    /// Current delay in seconds; advances the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result_seconds = self.current_minutes.saturating_mul(60);

        let next_minutes = self.prev_minutes.saturating_add(self.current_minutes);
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next_minutes.min(self.max_minutes);

        result_seconds
    }

    /// Same as `next_backoff_seconds`, as a `Duration`
    ///
    /// ```
    /// use app_secrets_controller::controller::backoff::FibonacciBackoff;
    /// use std::time::Duration;
    ///
    /// let mut backoff = FibonacciBackoff::new(2, 60);
    /// assert_eq!(backoff.next_backoff(), Duration::from_secs(120));
    /// ```
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Restart the sequence from the floor
    pub fn reset(&mut self) {
        self.prev_minutes = 0;
        self.current_minutes = self.min_minutes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sequence_caps_at_ceiling() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_backoff_seconds()).collect();
        assert_eq!(delays, vec![60, 60, 120, 180, 300, 480, 600, 600, 600]);
    }

    #[test]
    fn test_reset_restarts_from_floor() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        for _ in 0..5 {
            backoff.next_backoff_seconds();
        }
        backoff.reset();
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 120);
    }

    #[test]
    fn test_degenerate_bounds_are_normalized() {
        let mut backoff = FibonacciBackoff::new(0, 0);
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 60);
        assert_eq!(backoff.next_backoff_seconds(), 60);

        let mut backoff = FibonacciBackoff::new(5, 3);
        assert_eq!(backoff.next_backoff(), Duration::from_secs(300));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(300));
    }

    #[test]
    fn test_independent_instances() {
        let mut first = FibonacciBackoff::new(1, 10);
        let mut second = FibonacciBackoff::new(1, 10);

        for _ in 0..4 {
            first.next_backoff_seconds();
        }
        assert_eq!(second.next_backoff_seconds(), 60);
        assert_eq!(first.next_backoff_seconds(), 300);
    }
}
