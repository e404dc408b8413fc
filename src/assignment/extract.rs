//! Turning an assignment solution into an [`AssignmentOutput`].

use std::collections::BTreeMap;

use tracing::{debug, error, warn};

use super::AssignmentModel;
use crate::config::AssignmentMode;
use crate::engine::{MipSolution, SolveStatus};
use crate::models::{AssignmentInput, AssignmentOutput, OrderAssignment};

/// Reads the solution back into assignments and per-day metrics.
///
/// Per-day loads and areas are replayed from the chosen start days over each
/// demand's transit span. Slack is the solver's capacity overflow in
/// aggregate mode and the unused fleet capacity in per-truck mode.
pub(crate) fn extract(
    built: &AssignmentModel,
    input: &AssignmentInput,
    solution: &MipSolution,
    tolerance: f64,
) -> AssignmentOutput {
    if !solution.has_solution() {
        warn!(status = ?solution.status(), "no assignment solution");
        return AssignmentOutput::failure();
    }
    if *solution.status() == SolveStatus::TimeLimitWithIncumbent {
        warn!("assignment time limit reached, returning best-effort incumbent");
    }

    let mut chosen = Vec::with_capacity(input.demands.len());
    for (i, demand) in input.demands.iter().enumerate() {
        let best = built
            .assign
            .range(super::AssignKey { demand: i, start: 0, truck: None }..)
            .take_while(|(key, _)| key.demand == i)
            .map(|(key, &var)| (*key, solution.value(var)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        match best {
            Some((key, value)) if value > tolerance => chosen.push(key),
            _ => {
                error!(demand = demand.demand_id(), "solution leaves demand unassigned");
                return AssignmentOutput::failure();
            }
        }
    }

    let horizon = &input.planning_horizon;
    let assignments: Vec<OrderAssignment> = chosen
        .iter()
        .map(|key| {
            OrderAssignment::new(
                input.demands[key.demand].clone(),
                horizon[key.start],
                key.truck.map(|k| input.trucks[k].clone()),
            )
        })
        .collect();

    let mut loads = vec![0.0; horizon.len()];
    let mut areas = vec![0.0; horizon.len()];
    for key in &chosen {
        let demand = &input.demands[key.demand];
        let end = (key.start + demand.travel_days() as usize).min(horizon.len());
        for day in key.start..end {
            loads[day] += demand.weight();
            areas[day] += demand.size_area();
        }
    }

    let average = built.average_load;
    let fleet_capacity = input.fleet_capacity();
    let mut daily_loads = BTreeMap::new();
    let mut daily_areas = BTreeMap::new();
    let mut daily_slack = BTreeMap::new();
    let mut daily_balance = BTreeMap::new();
    for (day, date) in horizon.iter().enumerate() {
        let load = loads[day];
        let slack = match built.mode {
            AssignmentMode::Aggregate => solution.value(built.slack[day]).max(0.0),
            AssignmentMode::PerTruck => (fleet_capacity - load).max(0.0),
        };
        daily_loads.insert(*date, load);
        daily_areas.insert(*date, areas[day]);
        daily_slack.insert(*date, slack);
        daily_balance.insert(*date, (load - average).abs());
        debug!(
            %date,
            load,
            solver_load = solution.value(built.load[day]),
            deviation = solution.value(built.deviation[day]),
            slack,
            "daily load"
        );
    }

    let violated = built.model.violations(solution.values(), 1e-6);
    if !violated.is_empty() {
        warn!(count = violated.len(), first = violated[0], "solution violates model rows");
    }

    let output = AssignmentOutput {
        assignments,
        daily_loads,
        daily_areas: Some(daily_areas),
        daily_slack,
        daily_balance,
        objective_value: solution.objective_value().map(|v| v.max(0.0)),
        is_success: true,
    };
    log_usage(&output, input);
    output
}

fn log_usage(output: &AssignmentOutput, input: &AssignmentInput) {
    let loads = output.truck_loads();
    for truck in &input.trucks {
        let assigned = loads.get(&truck.id()).copied().unwrap_or(0.0);
        debug!(truck = truck.id(), assigned, capacity = truck.capacity(), "truck load");
    }
    for date in output.assigned_dates() {
        debug!(%date, trucks = output.trucks_on(date).len(), "trucks used");
    }
}
