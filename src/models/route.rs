//! Truck routes produced by the routing optimizer.

use serde::{Deserialize, Serialize};

use super::{Factory, Truck};

/// An ordered depot-to-depot sequence of factories served by one truck.
///
/// All per-node vectors are aligned with `route`: entry `i` describes the
/// arrival at `route[i]`. Distances are in km, times in minutes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckRoute {
    pub(crate) truck: Truck,
    pub(crate) route: Vec<Factory>,
    /// Load delivered so far, after serving the node.
    pub(crate) cumulative_load: Vec<f64>,
    /// Clock arrival times, present when the routing day is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) arrival_times: Option<Vec<String>>,
    /// Driving minutes of the leg ending at the node.
    pub(crate) travel_minutes: Vec<f64>,
    pub(crate) total_distance: f64,
    pub(crate) total_time: f64,
    pub(crate) stops: usize,
    pub(crate) travel_cost: f64,
    pub(crate) handling_cost: f64,
    pub(crate) total_cost: f64,
}

impl TruckRoute {
    /// The truck driving this route.
    pub fn truck(&self) -> &Truck {
        &self.truck
    }

    /// Visited factories, starting and ending at the depot.
    pub fn route(&self) -> &[Factory] {
        &self.route
    }

    /// Factories served, without the depot ends.
    pub fn stops_visited(&self) -> &[Factory] {
        if self.route.len() < 2 {
            return &[];
        }
        &self.route[1..self.route.len() - 1]
    }

    /// Cumulative delivered load per node.
    pub fn cumulative_load(&self) -> &[f64] {
        &self.cumulative_load
    }

    /// Clock arrival per node, if the routing day was known.
    pub fn arrival_times(&self) -> Option<&[String]> {
        self.arrival_times.as_deref()
    }

    /// Driving minutes of the leg ending at each node.
    pub fn travel_minutes(&self) -> &[f64] {
        &self.travel_minutes
    }

    /// Total distance in km.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Elapsed minutes from depot departure to depot return.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of non-depot stops.
    pub fn stops(&self) -> usize {
        self.stops
    }

    /// Truck cost rate times distance.
    pub fn travel_cost(&self) -> f64 {
        self.travel_cost
    }

    /// Fixed service cost times stops.
    pub fn handling_cost(&self) -> f64 {
        self.handling_cost
    }

    /// Travel plus handling cost.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Total load delivered on the route.
    pub fn total_load(&self) -> f64 {
        self.cumulative_load.last().copied().unwrap_or(0.0)
    }
}
