//! # u-dispatch
//!
//! Delivery planning with mixed-integer programming: demands are assigned
//! to days (and trucks) across a planning horizon, then each day's demands
//! are consolidated per destination and routed as a capacitated vehicle
//! routing problem with optional arrival windows.
//!
//! ## Modules
//!
//! - [`models`] — Domain types (Factory, Truck, Demand, assignment and routing inputs/outputs)
//! - [`distance`] — Distance records, pair lookup and dense distance matrix
//! - [`engine`] — MIP model description, engine trait and the `good_lp` engine
//! - [`assignment`] — Day/truck assignment optimizer with load balancing
//! - [`routing`] — Arc/flow CVRP optimizer with time windows
//! - [`evaluation`] — Route KPIs and result validation
//! - [`consolidation`] — Same-day, same-destination demand merging
//! - [`planner`] — Assignment followed by per-day routing
//! - [`format`] — JSON persistence of results
//! - [`config`] — Optimizer settings
//! - [`error`] — Error type

pub mod assignment;
pub mod config;
pub mod consolidation;
pub mod distance;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod format;
pub mod models;
pub mod planner;
pub mod routing;
