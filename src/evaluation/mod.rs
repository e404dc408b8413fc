//! Route KPIs and result validation.
//!
//! [`RouteEvaluator`] turns a node sequence into a [`TruckRoute`] with
//! cumulative load, leg times, clock arrivals and costs, reporting any
//! capacity, stop-count or arrival-window violations on the way.
//! [`validate_routes`] checks a whole [`CvrpOutput`] against its input.
//!
//! [`TruckRoute`]: crate::models::TruckRoute
//! [`CvrpOutput`]: crate::models::CvrpOutput

mod evaluator;
mod validate;

pub use evaluator::RouteEvaluator;
pub use validate::validate_routes;
