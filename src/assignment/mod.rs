//! Day/truck assignment of demands.
//!
//! Builds a MIP over `(demand, start day[, truck])` indicators, minimizes
//! `w_balance · Σ deviation + w_slack · Σ slack`, and turns the solution into
//! an [`AssignmentOutput`](crate::models::AssignmentOutput).
//!
//! Two capacity accountings are available through
//! [`AssignmentMode`](crate::config::AssignmentMode): a fleet-wide daily
//! capacity with penalized slack, and per-truck limits where a demand holds
//! its truck for every day of its transit.

mod extract;
mod model;
mod optimizer;

pub use model::{AssignKey, AssignmentModel, StopKey};
pub use optimizer::{assign_orders, AssignmentOptimizer};
