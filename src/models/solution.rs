//! Routing optimizer output and violation types.

use serde::{Deserialize, Serialize};

use super::TruckRoute;

/// A type of constraint violation found in a routing result.
#[derive(Debug, Clone, PartialEq)]
pub enum ViolationType {
    /// Cumulative load exceeds the truck's capacity.
    CapacityExceeded {
        /// Truck owning the route.
        truck_id: usize,
        /// Load at the offending node.
        load: f64,
        /// Truck capacity.
        capacity: f64,
    },
    /// Arrival after the destination's window closes.
    TimeWindowViolated {
        /// Factory where the violation occurred.
        factory_id: usize,
        /// Actual arrival, minutes past midnight.
        arrival: f64,
        /// Window close.
        due: f64,
    },
    /// A route does not start and end at the depot.
    DepotNotClosed {
        /// Truck owning the route.
        truck_id: usize,
    },
    /// More stops than allowed on one route.
    MaxStopsExceeded {
        /// Truck owning the route.
        truck_id: usize,
        /// Stops on the route.
        stops: usize,
        /// Allowed stops.
        max_stops: usize,
    },
    /// A destination is served more than once.
    DuplicateVisit {
        /// Factory visited twice.
        factory_id: usize,
    },
    /// A destination is not served by any route.
    MissingVisit {
        /// Factory never visited.
        factory_id: usize,
    },
}

/// A constraint violation in a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// Routes of one day with aggregate costs.
///
/// A failed run (`is_success == false`) has no routes and zero cost.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::CvrpOutput;
///
/// let failed = CvrpOutput::failure();
/// assert!(!failed.is_success);
/// assert!(failed.routes.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvrpOutput {
    pub routes: Vec<TruckRoute>,
    pub travel_cost: f64,
    pub handling_cost: f64,
    pub total_cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective_value: Option<f64>,
    #[serde(default = "default_success")]
    pub is_success: bool,
}

fn default_success() -> bool {
    true
}

impl CvrpOutput {
    /// Aggregates route costs into a successful result.
    pub fn from_routes(routes: Vec<TruckRoute>, objective_value: Option<f64>) -> Self {
        let travel_cost = routes.iter().map(TruckRoute::travel_cost).sum();
        let handling_cost = routes.iter().map(TruckRoute::handling_cost).sum();
        let total_cost = routes.iter().map(TruckRoute::total_cost).sum();
        Self {
            routes,
            travel_cost,
            handling_cost,
            total_cost,
            objective_value,
            is_success: true,
        }
    }

    /// The result of a run without a usable solution.
    pub fn failure() -> Self {
        Self {
            routes: Vec::new(),
            travel_cost: 0.0,
            handling_cost: 0.0,
            total_cost: 0.0,
            objective_value: None,
            is_success: false,
        }
    }

    /// Number of trucks used.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Total distance across all routes.
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().map(TruckRoute::total_distance).sum()
    }

    /// Total stops served across all routes.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(TruckRoute::stops).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_is_empty() {
        let out = CvrpOutput::failure();
        assert!(!out.is_success);
        assert_eq!(out.num_routes(), 0);
        assert_eq!(out.total_cost, 0.0);
        assert_eq!(out.num_served(), 0);
    }

    #[test]
    fn test_from_no_routes() {
        let out = CvrpOutput::from_routes(Vec::new(), Some(0.0));
        assert!(out.is_success);
        assert_eq!(out.total_distance(), 0.0);
    }

    #[test]
    fn test_violation_types() {
        let v = Violation::new(ViolationType::CapacityExceeded {
            truck_id: 1,
            load: 12.0,
            capacity: 10.0,
        });
        assert!(matches!(
            v.kind,
            ViolationType::CapacityExceeded { truck_id: 1, .. }
        ));
    }
}
