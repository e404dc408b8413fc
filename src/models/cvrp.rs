//! Routing optimizer input.

use chrono::NaiveDate;

use super::{Demand, Factory, TimeWindow, Truck};
use crate::distance::DistanceMatrix;

/// Consolidated demands of one day and the trucks that may serve them.
///
/// Node 0 of `distance_matrix` is the depot; node `i + 1` is the destination
/// of `demands[i]`.
#[derive(Debug, Clone)]
pub struct CvrpInput {
    pub demands: Vec<Demand>,
    pub trucks: Vec<Truck>,
    pub distance_matrix: DistanceMatrix,
    /// Routing day; when set, routes carry clock arrival times.
    pub date: Option<NaiveDate>,
}

impl CvrpInput {
    /// Creates an input without a routing day.
    pub fn new(demands: Vec<Demand>, trucks: Vec<Truck>, distance_matrix: DistanceMatrix) -> Self {
        Self {
            demands,
            trucks,
            distance_matrix,
            date: None,
        }
    }

    /// Sets the routing day.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Routing nodes in matrix order: the depot, then each demand's destination.
    pub fn nodes(&self, depot_id: usize) -> Vec<Factory> {
        std::iter::once(Factory::depot(depot_id))
            .chain(self.demands.iter().map(|d| d.destination().clone()))
            .collect()
    }

    /// Number of nodes including the depot.
    pub fn num_nodes(&self) -> usize {
        self.demands.len() + 1
    }

    /// Day the clock times refer to: `date`, or else the earliest available
    /// day among the demands.
    pub fn routing_day(&self) -> Option<NaiveDate> {
        self.date
            .or_else(|| self.demands.iter().map(Demand::available_date).min())
    }

    /// Arrival window of each node on the routing day, `None` at the depot
    /// and for demands already past due.
    pub fn node_windows(&self) -> Vec<Option<TimeWindow>> {
        let day = self.routing_day();
        std::iter::once(None)
            .chain(
                self.demands
                    .iter()
                    .map(|d| day.and_then(|day| d.window_on(day))),
            )
            .collect()
    }

    /// Load delivered at each node (0 at the depot).
    pub fn node_loads(&self) -> Vec<f64> {
        std::iter::once(0.0)
            .chain(self.demands.iter().map(Demand::weight))
            .collect()
    }
}
