//! Assignment optimizer entry points.

use tracing::{info, instrument};

use super::extract::extract;
use super::AssignmentModel;
use crate::config::AssignmentConfig;
use crate::engine::{GoodLpEngine, MipEngine};
use crate::error::Result;
use crate::models::{AssignmentInput, AssignmentOutput};

/// Assigns demands to days (and trucks) with a given engine.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_dispatch::assignment::AssignmentOptimizer;
/// use u_dispatch::config::AssignmentConfig;
/// use u_dispatch::engine::GoodLpEngine;
/// use u_dispatch::models::{AssignmentInput, Demand, Factory, Truck};
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
/// let demand = Demand::new(
///     "1",
///     5.0,
///     1.0,
///     Factory::new(1, "A"),
///     day(1).and_hms_opt(8, 0, 0).unwrap(),
///     day(2).and_hms_opt(17, 0, 0).unwrap(),
/// );
/// let input = AssignmentInput::new(
///     vec![demand],
///     vec![Truck::new(1, 10.0, 10.0)],
///     vec![day(1), day(2)],
/// );
///
/// let optimizer = AssignmentOptimizer::new(GoodLpEngine, AssignmentConfig::default());
/// let output = optimizer.assign(&input).unwrap();
/// assert!(output.is_success);
/// assert_eq!(output.assignments.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct AssignmentOptimizer<E> {
    engine: E,
    config: AssignmentConfig,
}

impl<E: MipEngine> AssignmentOptimizer<E> {
    /// Creates an optimizer.
    pub fn new(engine: E, config: AssignmentConfig) -> Self {
        Self { engine, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Builds, solves and extracts one assignment run.
    ///
    /// Structural input problems are errors; a solver without a usable
    /// solution yields `is_success == false`. A result reached through the
    /// time limit is best-effort.
    #[instrument(skip_all, fields(demands = input.demands.len(), trucks = input.trucks.len(), days = input.planning_horizon.len()))]
    pub fn assign(&self, input: &AssignmentInput) -> Result<AssignmentOutput> {
        let built = AssignmentModel::build(input, &self.config)?;
        let solution = self.engine.solve(built.model(), self.config.time_limit());
        info!(
            status = ?solution.status(),
            elapsed_ms = solution.elapsed().as_millis() as u64,
            "assignment solved"
        );
        Ok(extract(&built, input, &solution, self.config.tolerance))
    }
}

/// Assigns demands with the default `good_lp` engine.
pub fn assign_orders(input: &AssignmentInput, config: &AssignmentConfig) -> Result<AssignmentOutput> {
    AssignmentOptimizer::new(GoodLpEngine, config.clone()).assign(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AssignmentMode;
    use crate::engine::{MipModel, MipSolution, SolveStatus};
    use crate::error::DispatchError;
    use crate::models::{Demand, Factory, Truck};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("valid date")
    }

    fn demand(id: &str, weight: f64, dest: usize, from: u32, to: u32) -> Demand {
        Demand::new(
            id,
            weight,
            5.0,
            Factory::new(dest, format!("F{dest}")),
            day(from).and_hms_opt(8, 0, 0).expect("valid"),
            day(to).and_hms_opt(17, 0, 0).expect("valid"),
        )
    }

    fn check_invariants(input: &AssignmentInput, output: &AssignmentOutput) {
        assert!(output.is_success);
        assert_eq!(output.assignments.len(), input.demands.len());
        for a in &output.assignments {
            assert!(a.assigned_date >= a.demand.available_date());
            assert!(a.assigned_date <= a.demand.last_start_date().expect("in range"));
        }
        let capacity = input.fleet_capacity();
        for (date, load) in &output.daily_loads {
            assert!(*load <= capacity + output.daily_slack[date] + 1e-6);
            assert!(output.daily_slack[date] >= 0.0);
            assert!(output.daily_balance[date] >= 0.0);
        }
        assert!(output.objective_value.expect("solved") >= 0.0);
    }

    #[test]
    fn test_three_demands_two_trucks() {
        let input = AssignmentInput::new(
            vec![
                demand("1", 5.0, 1, 1, 5),
                demand("2", 5.0, 2, 2, 5),
                demand("3", 3.0, 3, 3, 5),
            ],
            vec![Truck::new(1, 3000.0, 15.0), Truck::new(2, 4000.0, 15.0)],
            (1..=5).map(day).collect(),
        );
        let output = assign_orders(&input, &AssignmentConfig::default()).expect("valid input");
        check_invariants(&input, &output);
        for load in output.daily_loads.values() {
            assert!(*load <= 7000.0);
        }
        assert!(output.assignments.iter().all(|a| a.truck.is_some()));
        let total: f64 = output.daily_loads.values().sum();
        assert!((total - 13.0).abs() < 1e-6);
    }

    #[test]
    fn test_balance_spreads_equal_demands() {
        let input = AssignmentInput::new(
            vec![demand("1", 10.0, 1, 1, 2), demand("2", 10.0, 2, 1, 2)],
            vec![Truck::new(1, 100.0, 100.0)],
            vec![day(1), day(2)],
        );
        let output = assign_orders(&input, &AssignmentConfig::default()).expect("valid input");
        check_invariants(&input, &output);
        assert!((output.daily_loads[&day(1)] - 10.0).abs() < 1e-6);
        assert!((output.daily_loads[&day(2)] - 10.0).abs() < 1e-6);
        assert!(output.objective_value.expect("solved").abs() < 1e-6);
    }

    #[test]
    fn test_multi_day_transit_blocks_truck() {
        // the 2-day demand holds the only truck on days 1 and 2, so the
        // other one must start on day 3
        let input = AssignmentInput::new(
            vec![
                demand("long", 8.0, 1, 1, 2).with_travel_days(2),
                demand("short", 8.0, 2, 1, 3),
            ],
            vec![Truck::new(1, 10.0, 100.0)],
            (1..=3).map(day).collect(),
        );
        let output = assign_orders(&input, &AssignmentConfig::default()).expect("valid input");
        check_invariants(&input, &output);
        assert_eq!(output.assignment_of("long").map(|a| a.assigned_date), Some(day(1)));
        assert_eq!(output.assignment_of("short").map(|a| a.assigned_date), Some(day(3)));
        assert!((output.daily_loads[&day(2)] - 8.0).abs() < 1e-6);
    }

    #[test]
    fn test_area_limit_respected() {
        let input = AssignmentInput::new(
            vec![demand("1", 1.0, 1, 1, 2), demand("2", 1.0, 1, 1, 2)],
            vec![Truck::new(1, 100.0, 5.0)],
            vec![day(1), day(2)],
        );
        let output = assign_orders(&input, &AssignmentConfig::default()).expect("valid input");
        check_invariants(&input, &output);
        let areas = output.daily_areas.as_ref().expect("areas");
        assert!(areas.values().all(|a| *a <= 5.0 + 1e-6));
    }

    #[test]
    fn test_per_truck_overload_fails_gracefully() {
        let input = AssignmentInput::new(
            vec![demand("1", 50.0, 1, 1, 1)],
            vec![Truck::new(1, 10.0, 100.0)],
            vec![day(1)],
        );
        let output = assign_orders(&input, &AssignmentConfig::default()).expect("valid input");
        assert!(!output.is_success);
        assert!(output.assignments.is_empty());
        assert!(output.daily_loads.is_empty());
    }

    #[test]
    fn test_aggregate_uses_slack_when_overloaded() {
        let input = AssignmentInput::new(
            vec![demand("1", 50.0, 1, 1, 1)],
            vec![Truck::new(1, 10.0, 100.0)],
            vec![day(1)],
        );
        let config = AssignmentConfig::default().with_mode(AssignmentMode::Aggregate);
        let output = assign_orders(&input, &config).expect("valid input");
        check_invariants(&input, &output);
        assert!((output.daily_slack[&day(1)] - 40.0).abs() < 1e-6);
        assert!(output.assignments[0].truck.is_none());
        assert!((output.objective_value.expect("solved") - 40_000.0).abs() < 1e-3);
    }

    #[test]
    fn test_max_stops_per_truck_day() {
        let input = AssignmentInput::new(
            vec![
                demand("1", 1.0, 1, 1, 2),
                demand("2", 1.0, 2, 1, 2),
                demand("3", 1.0, 3, 1, 2),
            ],
            vec![Truck::new(1, 100.0, 100.0)],
            vec![day(1), day(2)],
        );
        let config = AssignmentConfig::default().with_max_stops(Some(2));
        let output = assign_orders(&input, &config).expect("valid input");
        check_invariants(&input, &output);
        for date in [day(1), day(2)] {
            assert!(output.demands_on(date).len() <= 2);
        }
    }

    #[test]
    fn test_infeasible_demand_is_error() {
        let input = AssignmentInput::new(
            vec![demand("1", 1.0, 1, 10, 12)],
            vec![Truck::new(1, 10.0, 10.0)],
            vec![day(1), day(2)],
        );
        let err = assign_orders(&input, &AssignmentConfig::default()).expect_err("infeasible");
        assert!(matches!(err, DispatchError::InfeasibleDemands { .. }));
    }

    struct TimedOut;

    impl MipEngine for TimedOut {
        fn solve(&self, _model: &MipModel, _limit: Duration) -> MipSolution {
            MipSolution::without_values(SolveStatus::TimeLimit, Duration::ZERO)
        }
    }

    #[test]
    fn test_time_limit_without_incumbent_is_failure() {
        let input = AssignmentInput::new(
            vec![demand("1", 1.0, 1, 1, 2)],
            vec![Truck::new(1, 10.0, 10.0)],
            vec![day(1), day(2)],
        );
        let output = AssignmentOptimizer::new(TimedOut, AssignmentConfig::default())
            .assign(&input)
            .expect("valid input");
        assert!(!output.is_success);
        assert!(output.objective_value.is_none());
    }
}
