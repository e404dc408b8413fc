//! Routing optimizer entry points.

use tracing::{debug, error, info, instrument};

use super::extract::extract;
use super::RoutingModel;
use crate::config::RoutingConfig;
use crate::engine::{GoodLpEngine, MipEngine};
use crate::error::Result;
use crate::evaluation::validate_routes;
use crate::models::{CvrpInput, CvrpOutput, ViolationType};

/// Routes one day's demands with a given engine.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use u_dispatch::config::RoutingConfig;
/// use u_dispatch::distance::DistanceMatrix;
/// use u_dispatch::engine::GoodLpEngine;
/// use u_dispatch::models::{CvrpInput, Demand, Factory, Truck};
/// use u_dispatch::routing::RoutingOptimizer;
///
/// let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(8, 0, 0).unwrap();
/// let demands = vec![Demand::new("a", 5.0, 1.0, Factory::new(1, "A"), at, at)];
/// let matrix = DistanceMatrix::from_rows(vec![vec![0.0, 12.0], vec![12.0, 0.0]]).unwrap();
/// let input = CvrpInput::new(demands, vec![Truck::new(1, 10.0, 10.0)], matrix);
///
/// let optimizer = RoutingOptimizer::new(GoodLpEngine, RoutingConfig::default());
/// let output = optimizer.route(&input).unwrap();
/// assert!(output.is_success);
/// assert_eq!(output.num_routes(), 1);
/// assert!((output.total_distance() - 24.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct RoutingOptimizer<E> {
    engine: E,
    config: RoutingConfig,
}

impl<E: MipEngine> RoutingOptimizer<E> {
    /// Creates an optimizer.
    pub fn new(engine: E, config: RoutingConfig) -> Self {
        Self { engine, config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Builds, solves and extracts one routing run.
    ///
    /// Structural input problems are errors; a solver without a usable
    /// solution yields `is_success == false`. A day without demands routes
    /// nothing and succeeds.
    #[instrument(skip_all, fields(demands = input.demands.len(), trucks = input.trucks.len(), date = ?input.date))]
    pub fn route(&self, input: &CvrpInput) -> Result<CvrpOutput> {
        let built = RoutingModel::build(input, &self.config)?;
        if input.demands.is_empty() {
            return Ok(CvrpOutput::from_routes(Vec::new(), Some(0.0)));
        }
        let solution = self.engine.solve(built.model(), self.config.time_limit());
        info!(
            status = ?solution.status(),
            elapsed_ms = solution.elapsed().as_millis() as u64,
            "routing solved"
        );
        let output = extract(&built, input, &self.config, &solution);
        if !output.is_success {
            return Ok(output);
        }

        let violations = validate_routes(&output, input, &self.config);
        let broken: Vec<&ViolationType> = violations
            .iter()
            .map(|v| &v.kind)
            .filter(|kind| {
                matches!(
                    kind,
                    ViolationType::MissingVisit { .. }
                        | ViolationType::DuplicateVisit { .. }
                        | ViolationType::DepotNotClosed { .. }
                )
            })
            .collect();
        if !broken.is_empty() {
            error!(?broken, "routes do not cover every destination exactly once");
            return Ok(CvrpOutput::failure());
        }
        debug!(
            routes = output.num_routes(),
            distance = output.total_distance(),
            total_cost = output.total_cost,
            violations = violations.len(),
            "routes extracted"
        );
        Ok(output)
    }
}

/// Routes one day with the default `good_lp` engine.
pub fn route_trucks(input: &CvrpInput, config: &RoutingConfig) -> Result<CvrpOutput> {
    RoutingOptimizer::new(GoodLpEngine, config.clone()).route(input)
}
