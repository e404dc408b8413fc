//! Optimizer configuration.
//!
//! Every optimizer call takes its configuration explicitly; nothing is read
//! from global state. All types deserialize with per-field defaults so a
//! partial JSON object is enough.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Capacity accounting of the assignment model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// One fleet-wide capacity per day, exceedable at the slack penalty.
    /// Demands are not bound to trucks.
    Aggregate,
    /// Each demand takes one truck for its whole transit span; per-truck
    /// weight and area limits hold on every day.
    #[default]
    PerTruck,
}

/// Settings of the assignment optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    pub mode: AssignmentMode,
    /// Distinct destinations a truck may start towards on one day.
    /// Only used in [`AssignmentMode::PerTruck`].
    pub max_stops_per_truck_day: Option<usize>,
    /// Solver time limit in milliseconds.
    pub time_limit_ms: u64,
    /// Threshold above which a binary is read as 1.
    pub tolerance: f64,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            mode: AssignmentMode::PerTruck,
            max_stops_per_truck_day: Some(5),
            time_limit_ms: 1_800_000,
            tolerance: 0.5,
        }
    }
}

impl AssignmentConfig {
    /// Sets the capacity accounting mode.
    pub fn with_mode(mut self, mode: AssignmentMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets (or removes) the per-truck-day stop bound.
    pub fn with_max_stops(mut self, max_stops: Option<usize>) -> Self {
        self.max_stops_per_truck_day = max_stops;
        self
    }

    /// Sets the solver time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Solver time limit.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// Settings of the routing optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Factory id reserved for the depot.
    pub depot_id: usize,
    /// Stops allowed on one route.
    pub max_stops: usize,
    /// Minutes spent unloading at each stop.
    pub service_time_minutes: f64,
    /// Fixed cost charged per stop.
    pub service_cost: f64,
    /// Enforce destination arrival windows.
    pub time_windows: bool,
    /// Depot departure, minutes past midnight of the routing day.
    pub departure_minutes: f64,
    /// Extra room added to the big-M of the arrival-time constraints.
    pub big_m_margin_minutes: f64,
    /// Divide distances by the largest pairwise distance in the objective.
    pub normalize_distances: bool,
    /// Objective weight of the flow regularizer.
    pub flow_weight: f64,
    /// Solver time limit in milliseconds.
    pub time_limit_ms: u64,
    /// Threshold above which a binary is read as 1.
    pub tolerance: f64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            depot_id: 0,
            max_stops: 5,
            service_time_minutes: 30.0,
            service_cost: 100.0,
            time_windows: false,
            departure_minutes: 480.0,
            big_m_margin_minutes: 60.0,
            normalize_distances: true,
            flow_weight: 1e-3,
            time_limit_ms: 1_800_000,
            tolerance: 0.5,
        }
    }
}

impl RoutingConfig {
    /// Sets the depot id.
    pub fn with_depot(mut self, depot_id: usize) -> Self {
        self.depot_id = depot_id;
        self
    }

    /// Sets the per-route stop bound.
    pub fn with_max_stops(mut self, max_stops: usize) -> Self {
        self.max_stops = max_stops;
        self
    }

    /// Sets the per-stop service time and fixed cost.
    pub fn with_service(mut self, minutes: f64, cost: f64) -> Self {
        self.service_time_minutes = minutes;
        self.service_cost = cost;
        self
    }

    /// Enables or disables arrival windows.
    pub fn with_time_windows(mut self, enabled: bool) -> Self {
        self.time_windows = enabled;
        self
    }

    /// Sets the depot departure clock, in minutes past midnight.
    pub fn with_departure(mut self, minutes: f64) -> Self {
        self.departure_minutes = minutes;
        self
    }

    /// Sets the flow regularizer weight and distance normalization.
    pub fn with_objective_tuning(mut self, flow_weight: f64, normalize_distances: bool) -> Self {
        self.flow_weight = flow_weight;
        self.normalize_distances = normalize_distances;
        self
    }

    /// Sets the solver time limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Solver time limit.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// Settings of a full planning cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub assignment: AssignmentConfig,
    pub routing: RoutingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let a = AssignmentConfig::default();
        assert_eq!(a.mode, AssignmentMode::PerTruck);
        assert_eq!(a.max_stops_per_truck_day, Some(5));
        assert_eq!(a.time_limit(), Duration::from_secs(1800));

        let r = RoutingConfig::default();
        assert_eq!(r.depot_id, 0);
        assert_eq!(r.max_stops, 5);
        assert!(!r.time_windows);
    }

    #[test]
    fn test_partial_json() {
        let cfg: PlannerConfig = serde_json::from_str(
            r#"{"assignment": {"mode": "aggregate"}, "routing": {"max_stops": 3, "time_windows": true}}"#,
        )
        .expect("valid config");
        assert_eq!(cfg.assignment.mode, AssignmentMode::Aggregate);
        assert_eq!(cfg.assignment.tolerance, 0.5);
        assert_eq!(cfg.routing.max_stops, 3);
        assert!(cfg.routing.time_windows);
        assert_eq!(cfg.routing.service_time_minutes, 30.0);
    }

    #[test]
    fn test_builders() {
        let r = RoutingConfig::default()
            .with_depot(9)
            .with_service(10.0, 5.0)
            .with_time_limit(Duration::from_secs(60));
        assert_eq!(r.depot_id, 9);
        assert_eq!(r.service_cost, 5.0);
        assert_eq!(r.time_limit_ms, 60_000);
    }

    #[test]
    fn test_sub_second_time_limit() {
        let a = AssignmentConfig::default().with_time_limit(Duration::from_millis(999));
        assert_eq!(a.time_limit_ms, 999);
        assert_eq!(a.time_limit(), Duration::from_millis(999));

        let r = RoutingConfig::default().with_time_limit(Duration::from_millis(250));
        assert_eq!(r.time_limit(), Duration::from_millis(250));
    }
}
