//! Assignment MIP construction.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::{AssignmentConfig, AssignmentMode};
use crate::engine::{LinearExpr, MipModel, VarId};
use crate::error::{DispatchError, Result};
use crate::models::AssignmentInput;

/// Key of an assignment indicator: demand, start day and, in per-truck mode,
/// truck (all as positions in the input lists).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssignKey {
    pub demand: usize,
    pub start: usize,
    pub truck: Option<usize>,
}

/// Key of a destination-visited indicator: destination factory id, start
/// day position and truck position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopKey {
    pub destination: usize,
    pub start: usize,
    pub truck: usize,
}

/// The assignment MIP together with the maps from domain keys to variables.
#[derive(Debug, Clone)]
pub struct AssignmentModel {
    pub(crate) model: MipModel,
    pub(crate) mode: AssignmentMode,
    pub(crate) assign: BTreeMap<AssignKey, VarId>,
    pub(crate) stops: BTreeMap<StopKey, VarId>,
    pub(crate) load: Vec<VarId>,
    pub(crate) deviation: Vec<VarId>,
    pub(crate) slack: Vec<VarId>,
    pub(crate) average_load: f64,
}

impl AssignmentModel {
    /// Builds the model, rejecting structurally invalid inputs.
    ///
    /// Fails with [`DispatchError::InfeasibleDemands`] when any demand has no
    /// feasible start day, and with [`DispatchError::NoTrucks`] in per-truck
    /// mode without trucks.
    pub fn build(input: &AssignmentInput, config: &AssignmentConfig) -> Result<Self> {
        input.validate()?;
        if config.mode == AssignmentMode::PerTruck
            && input.trucks.is_empty()
            && !input.demands.is_empty()
        {
            return Err(DispatchError::NoTrucks {
                demands: input.demands.len(),
            });
        }

        let index = input.date_index();
        let feasible: Vec<Vec<usize>> = input
            .demands
            .iter()
            .map(|d| {
                d.feasible_dates(&input.planning_horizon)
                    .iter()
                    .filter_map(|fd| index.get(fd).copied())
                    .collect()
            })
            .collect();
        let infeasible: Vec<String> = input
            .demands
            .iter()
            .zip(&feasible)
            .filter(|(_, days)| days.is_empty())
            .map(|(d, _)| d.demand_id().to_string())
            .collect();
        if !infeasible.is_empty() {
            return Err(DispatchError::InfeasibleDemands {
                demand_ids: infeasible,
            });
        }

        let horizon = input.planning_horizon.len();
        let average_load = input.average_load();
        let mut model = MipModel::new(match config.mode {
            AssignmentMode::Aggregate => "assignment_aggregate",
            AssignmentMode::PerTruck => "assignment_per_truck",
        });

        let trucks: Vec<Option<usize>> = match config.mode {
            AssignmentMode::Aggregate => vec![None],
            AssignmentMode::PerTruck => (0..input.trucks.len()).map(Some).collect(),
        };

        let mut assign = BTreeMap::new();
        for (i, days) in feasible.iter().enumerate() {
            let mut once = LinearExpr::new();
            for &start in days {
                for &truck in &trucks {
                    let key = AssignKey {
                        demand: i,
                        start,
                        truck,
                    };
                    let var = model.add_binary(format!("x_{i}_{start}_{truck:?}"));
                    assign.insert(key, var);
                    once.add_term(var, 1.0);
                }
            }
            model.add_eq(format!("assign_once_{i}"), once, 1.0);
        }

        // a demand started on `s` is active on `s .. s + travel_days`
        let active = |key: &AssignKey, day: usize| {
            let travel = input.demands[key.demand].travel_days() as usize;
            key.start <= day && day < key.start + travel
        };

        let mut load = Vec::with_capacity(horizon);
        let mut deviation = Vec::with_capacity(horizon);
        let mut slack = Vec::with_capacity(horizon);
        let fleet_capacity = input.fleet_capacity();
        for day in 0..horizon {
            let l = model.add_continuous(format!("load_{day}"), 0.0, f64::INFINITY);
            let z = model.add_continuous(format!("dev_{day}"), 0.0, f64::INFINITY);
            let s = model.add_continuous(format!("slack_{day}"), 0.0, f64::INFINITY);

            let mut definition = LinearExpr::new().with_term(l, 1.0);
            for (key, &var) in assign.iter().filter(|(k, _)| active(k, day)) {
                definition.add_term(var, -input.demands[key.demand].weight());
            }
            model.add_eq(format!("load_def_{day}"), definition, 0.0);

            model.add_ge(
                format!("pos_dev_{day}"),
                LinearExpr::new().with_term(z, 1.0).with_term(l, -1.0),
                -average_load,
            );
            model.add_ge(
                format!("neg_dev_{day}"),
                LinearExpr::new().with_term(z, 1.0).with_term(l, 1.0),
                average_load,
            );

            match config.mode {
                AssignmentMode::Aggregate => model.add_le(
                    format!("capacity_{day}"),
                    LinearExpr::new().with_term(l, 1.0).with_term(s, -1.0),
                    fleet_capacity,
                ),
                AssignmentMode::PerTruck => model.fix(s, 0.0),
            }

            load.push(l);
            deviation.push(z);
            slack.push(s);
        }

        let mut stops = BTreeMap::new();
        if config.mode == AssignmentMode::PerTruck {
            for (k, truck) in input.trucks.iter().enumerate() {
                for day in 0..horizon {
                    let mut weight = LinearExpr::new();
                    let mut area = LinearExpr::new();
                    for (key, &var) in assign
                        .iter()
                        .filter(|(key, _)| key.truck == Some(k) && active(key, day))
                    {
                        let demand = &input.demands[key.demand];
                        weight.add_term(var, demand.weight());
                        area.add_term(var, demand.size_area());
                    }
                    model.add_le(format!("truck_cap_{k}_{day}"), weight, truck.capacity());
                    model.add_le(format!("truck_area_{k}_{day}"), area, truck.inner_size());
                }
            }

            if let Some(max_stops) = config.max_stops_per_truck_day {
                for (key, &var) in &assign {
                    let Some(truck) = key.truck else { continue };
                    let stop = StopKey {
                        destination: input.demands[key.demand].destination().id(),
                        start: key.start,
                        truck,
                    };
                    let u = *stops.entry(stop).or_insert_with(|| {
                        model.add_binary(format!(
                            "u_{}_{}_{}",
                            stop.destination, stop.start, stop.truck
                        ))
                    });
                    model.add_ge(
                        format!("stop_link_{}_{}_{truck}", key.demand, key.start),
                        LinearExpr::new().with_term(u, 1.0).with_term(var, -1.0),
                        0.0,
                    );
                }
                let truck_days: BTreeSet<(usize, usize)> =
                    stops.keys().map(|s| (s.truck, s.start)).collect();
                for (truck, start) in truck_days {
                    let visited: LinearExpr = stops
                        .iter()
                        .filter(|(s, _)| s.truck == truck && s.start == start)
                        .map(|(_, &u)| (u, 1.0))
                        .collect();
                    model.add_le(
                        format!("max_stops_{truck}_{start}"),
                        visited,
                        max_stops as f64,
                    );
                }
            }
        }

        let objective: LinearExpr = deviation
            .iter()
            .map(|&z| (z, input.w_balance))
            .chain(slack.iter().map(|&s| (s, input.w_slack)))
            .collect();
        model.set_objective(objective);

        debug!(
            model = model.name(),
            vars = model.num_vars(),
            binaries = model.num_binaries(),
            constraints = model.num_constraints(),
            "assignment model built"
        );

        Ok(Self {
            model,
            mode: config.mode,
            assign,
            stops,
            load,
            deviation,
            slack,
            average_load,
        })
    }

    /// The underlying MIP.
    pub fn model(&self) -> &MipModel {
        &self.model
    }

    /// Assignment indicator of a key, if it exists.
    pub fn assign_var(&self, key: &AssignKey) -> Option<VarId> {
        self.assign.get(key).copied()
    }

    /// Number of assignment indicators.
    pub fn num_assign_vars(&self) -> usize {
        self.assign.len()
    }

    /// Number of destination-visited indicators.
    pub fn num_stop_vars(&self) -> usize {
        self.stops.len()
    }

    /// Horizon-wide average daily load.
    pub fn average_load(&self) -> f64 {
        self.average_load
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Demand, Factory, Truck};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
    }

    fn demand(id: &str, dest: usize, from: u32, to: u32) -> Demand {
        Demand::new(
            id,
            5.0,
            2.0,
            Factory::new(dest, format!("F{dest}")),
            day(from).and_hms_opt(8, 0, 0).expect("valid"),
            day(to).and_hms_opt(17, 0, 0).expect("valid"),
        )
    }

    fn input(demands: Vec<Demand>, trucks: usize) -> AssignmentInput {
        AssignmentInput::new(
            demands,
            (1..=trucks).map(|k| Truck::new(k, 100.0, 10.0)).collect(),
            (1..=5).map(day).collect(),
        )
    }

    #[test]
    fn test_per_truck_variable_counts() {
        let built = AssignmentModel::build(
            &input(vec![demand("1", 1, 1, 2), demand("2", 1, 2, 4)], 2),
            &AssignmentConfig::default(),
        )
        .expect("valid input");
        // (2 + 3) feasible days × 2 trucks
        assert_eq!(built.num_assign_vars(), 10);
        // destination 1 on days 1..=4 for both trucks
        assert_eq!(built.num_stop_vars(), 8);
        assert!(built
            .assign_var(&AssignKey {
                demand: 1,
                start: 3,
                truck: Some(1)
            })
            .is_some());
        assert!(built
            .assign_var(&AssignKey {
                demand: 0,
                start: 3,
                truck: Some(0)
            })
            .is_none());
        assert!((built.average_load() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregate_has_no_truck_keys() {
        let config = AssignmentConfig::default().with_mode(AssignmentMode::Aggregate);
        let built = AssignmentModel::build(&input(vec![demand("1", 1, 1, 3)], 0), &config)
            .expect("aggregate mode allows an empty fleet");
        assert_eq!(built.num_assign_vars(), 3);
        assert_eq!(built.num_stop_vars(), 0);
        assert!(built.model().constraints().iter().any(|c| c.name == "capacity_0"));
    }

    #[test]
    fn test_infeasible_demand_is_rejected() {
        let err = AssignmentModel::build(
            &input(vec![demand("ok", 1, 1, 2), demand("late", 1, 9, 10)], 1),
            &AssignmentConfig::default(),
        )
        .expect_err("demand outside the horizon");
        match err {
            DispatchError::InfeasibleDemands { demand_ids } => {
                assert_eq!(demand_ids, vec!["late".to_string()])
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_per_truck_requires_trucks() {
        let err = AssignmentModel::build(
            &input(vec![demand("1", 1, 1, 2)], 0),
            &AssignmentConfig::default(),
        )
        .expect_err("no trucks");
        assert!(matches!(err, DispatchError::NoTrucks { demands: 1 }));
    }

    #[test]
    fn test_multi_day_demand_occupies_span() {
        let long = demand("1", 1, 1, 5).with_travel_days(3);
        let built = AssignmentModel::build(&input(vec![long], 1), &AssignmentConfig::default())
            .expect("valid input");
        // starts on days 1..=3 only
        assert_eq!(built.num_assign_vars(), 3);
        let cap_day_2 = built
            .model()
            .constraints()
            .iter()
            .find(|c| c.name == "truck_cap_0_2")
            .expect("capacity row");
        // every start (0, 1, 2) is active on day index 2
        assert_eq!(cap_day_2.expr.terms().len(), 3);
    }
}
