//! Routing optimizer: capacitated vehicle routing with arrival windows.
//!
//! One day's consolidated demands are routed over the trucks available that
//! day. The formulation is a per-truck arc/flow MIP:
//!
//! - `x[i, j, k]` marks truck `k` driving the arc `i -> j`;
//! - `f[i, j, k]` is the load still on board along that arc, bounded by
//!   `q[j]·x <= f <= (Q[k] - q[i])·x` and falling by `q[i]` at each visit;
//! - `c[i, j, k]` counts the stops still ahead on that arc and falls by one
//!   at each visit, which forbids subtours detached from the depot, even
//!   through zero-weight stops;
//! - `visit[i, k]` marks node `i` served by truck `k`, exactly once overall;
//! - with arrival windows enabled, `arrival[i, k]` propagates along used arcs
//!   through big-M constraints.
//!
//! Routes are read back by walking the used arcs from the depot and then
//! handed to [`RouteEvaluator`](crate::evaluation::RouteEvaluator) for KPIs.

mod extract;
mod model;
mod optimizer;

pub use extract::{trace_path, PathDefect, PathTrace};
pub use model::{ArcKey, NodeKey, RoutingModel};
pub use optimizer::{route_trucks, RoutingOptimizer};
