//! Arrival time windows.

use serde::{Deserialize, Serialize};

/// A time window on arrival at a stop, in minutes past the routing day's
/// midnight.
///
/// A truck may arrive as early as `ready` (waiting if early) and no later
/// than `due`.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::TimeWindow;
///
/// let tw = TimeWindow::new(480.0, 1020.0).unwrap();
/// assert!(tw.contains(600.0));
/// assert_eq!(tw.waiting_time(420.0), 60.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    ready: f64,
    due: f64,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// Returns `None` if `ready > due` or either value is non-finite.
    pub fn new(ready: f64, due: f64) -> Option<Self> {
        if !ready.is_finite() || !due.is_finite() || ready > due {
            return None;
        }
        Some(Self { ready, due })
    }

    /// Earliest allowable arrival.
    pub fn ready(&self) -> f64 {
        self.ready
    }

    /// Latest allowable arrival.
    pub fn due(&self) -> f64 {
        self.due
    }

    /// Width of the window.
    pub fn span(&self) -> f64 {
        self.due - self.ready
    }

    /// Returns `true` if the given time falls within this window.
    pub fn contains(&self, time: f64) -> bool {
        time >= self.ready && time <= self.due
    }

    /// Waiting time when arriving at `arrival`; zero once the window is open.
    pub fn waiting_time(&self, arrival: f64) -> f64 {
        if arrival < self.ready {
            self.ready - arrival
        } else {
            0.0
        }
    }

    /// Returns `true` if arriving at `arrival` is too late.
    pub fn is_violated(&self, arrival: f64) -> bool {
        arrival > self.due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_invalid() {
        assert!(TimeWindow::new(20.0, 10.0).is_none());
        assert!(TimeWindow::new(f64::NAN, 10.0).is_none());
        assert!(TimeWindow::new(10.0, f64::INFINITY).is_none());
    }

    #[test]
    fn test_time_window_contains() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!(tw.contains(10.0));
        assert!(tw.contains(20.0));
        assert!(!tw.contains(9.9));
        assert!(!tw.contains(20.1));
        assert_eq!(tw.span(), 10.0);
    }

    #[test]
    fn test_time_window_waiting_and_violation() {
        let tw = TimeWindow::new(10.0, 20.0).expect("valid");
        assert!((tw.waiting_time(5.0) - 5.0).abs() < 1e-10);
        assert_eq!(tw.waiting_time(15.0), 0.0);
        assert!(!tw.is_violated(20.0));
        assert!(tw.is_violated(20.1));
    }
}
