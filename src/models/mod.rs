//! Domain model types for dispatch planning.
//!
//! Provides factories and the depot, trucks, time-windowed demands, the
//! assignment run records, and the routing run records with their
//! violation types.

mod assignment;
mod cvrp;
mod demand;
mod factory;
mod route;
mod solution;
mod truck;
mod window;

pub use assignment::{AssignmentInput, AssignmentOutput, OrderAssignment};
pub use cvrp::CvrpInput;
pub use demand::{Demand, LOAD_HOURS, UNLOAD_HOURS, WORK_HOURS_PER_DAY};
pub use factory::Factory;
pub use route::TruckRoute;
pub use solution::{CvrpOutput, Violation, ViolationType};
pub use truck::Truck;
pub use window::TimeWindow;
