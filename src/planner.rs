//! End-to-end planning cycle.
//!
//! The assignment runs once over the whole horizon. Each assigned start day
//! is then consolidated and routed on its own, in ascending date order, with
//! the trucks the assignment used that day.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{info, instrument, warn};

use crate::assignment::AssignmentOptimizer;
use crate::config::PlannerConfig;
use crate::consolidation::consolidate;
use crate::distance::{DistanceMatrix, DistanceTable};
use crate::engine::{GoodLpEngine, MipEngine};
use crate::error::Result;
use crate::models::{AssignmentInput, AssignmentOutput, CvrpInput, CvrpOutput, Factory, Truck};
use crate::routing::RoutingOptimizer;

/// Assignment and per-day routes of one planning cycle.
#[derive(Debug, Clone)]
pub struct CyclePlan {
    pub assignment: AssignmentOutput,
    /// Routing result per assigned start day.
    pub routes: BTreeMap<NaiveDate, CvrpOutput>,
}

impl CyclePlan {
    /// Returns `true` if the assignment and every day's routing succeeded.
    pub fn is_success(&self) -> bool {
        self.assignment.is_success && self.routes.values().all(|r| r.is_success)
    }

    /// Summed cost of all successful days.
    pub fn total_cost(&self) -> f64 {
        self.routes
            .values()
            .filter(|r| r.is_success)
            .map(|r| r.total_cost)
            .sum()
    }
}

/// Builds the routing input of one day: consolidated demands, the trucks to
/// use and the distance matrix over `[depot] + destinations`.
pub fn day_input(
    assignment: &AssignmentOutput,
    date: NaiveDate,
    table: &DistanceTable,
    fleet: &[Truck],
    depot_id: usize,
) -> Result<CvrpInput> {
    let demands = consolidate(assignment, date)?;
    let mut trucks = assignment.trucks_on(date);
    if trucks.is_empty() {
        trucks = fleet.to_vec();
    }
    let nodes: Vec<Factory> = std::iter::once(Factory::depot(depot_id))
        .chain(demands.iter().map(|d| d.destination().clone()))
        .collect();
    let matrix = DistanceMatrix::from_table(table, &nodes);
    Ok(CvrpInput::new(demands, trucks, matrix).with_date(date))
}

/// Runs one planning cycle with `engine`.
///
/// A failed assignment ends the cycle without routes. A day whose routing
/// finds no solution is kept with `is_success == false`; structural errors
/// abort the cycle.
#[instrument(skip_all, fields(demands = input.demands.len(), trucks = input.trucks.len()))]
pub fn plan_cycle<E: MipEngine>(
    input: &AssignmentInput,
    table: &DistanceTable,
    config: &PlannerConfig,
    engine: &E,
) -> Result<CyclePlan> {
    let assignment = AssignmentOptimizer::new(engine, config.assignment.clone()).assign(input)?;
    let mut routes = BTreeMap::new();
    if !assignment.is_success {
        warn!("assignment failed, no days to route");
        return Ok(CyclePlan { assignment, routes });
    }

    let router = RoutingOptimizer::new(engine, config.routing.clone());
    for date in assignment.assigned_dates() {
        let day = day_input(&assignment, date, table, &input.trucks, config.routing.depot_id)?;
        let output = router.route(&day)?;
        if output.is_success {
            info!(
                %date,
                routes = output.num_routes(),
                total_cost = output.total_cost,
                "day routed"
            );
        } else {
            warn!(%date, "routing failed for day");
        }
        routes.insert(date, output);
    }
    Ok(CyclePlan { assignment, routes })
}

/// Runs one planning cycle with the default `good_lp` engine.
pub fn plan(input: &AssignmentInput, table: &DistanceTable, config: &PlannerConfig) -> Result<CyclePlan> {
    plan_cycle(input, table, config, &GoodLpEngine)
}
