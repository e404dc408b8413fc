//! Route reconstruction from arc values.

use std::collections::BTreeSet;

use tracing::{error, warn};

use super::{ArcKey, NodeKey, RoutingModel};
use crate::config::RoutingConfig;
use crate::engine::{MipSolution, SolveStatus};
use crate::evaluation::RouteEvaluator;
use crate::models::{CvrpInput, CvrpOutput};

/// Why a depot walk stopped before returning to the depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathDefect {
    /// No used arc leaves this node.
    DeadEnd(usize),
    /// The walk came back to an already visited node.
    Cycle(usize),
    /// More steps than nodes were taken.
    TooLong,
}

/// Result of walking used arcs from the depot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTrace {
    /// Visited nodes in order, depot excluded.
    pub nodes: Vec<usize>,
    /// Set when the walk did not close at the depot.
    pub defect: Option<PathDefect>,
}

/// Follows `arcs` (used `from -> to` pairs of one truck) from node 0.
///
/// The walk takes at most `num_nodes` steps, never revisits a node and stops
/// at the first arc back to the depot. An empty trace without defect means
/// the truck stays at the depot.
pub fn trace_path(arcs: &[(usize, usize)], num_nodes: usize) -> PathTrace {
    let mut nodes = Vec::new();
    let mut seen = BTreeSet::new();
    let mut current = 0;
    for _ in 0..num_nodes {
        let next = arcs.iter().find(|&&(from, _)| from == current).map(|&(_, to)| to);
        match next {
            None if current == 0 => return PathTrace { nodes, defect: None },
            None => {
                return PathTrace {
                    nodes,
                    defect: Some(PathDefect::DeadEnd(current)),
                }
            }
            Some(0) => return PathTrace { nodes, defect: None },
            Some(node) if !seen.insert(node) => {
                return PathTrace {
                    nodes,
                    defect: Some(PathDefect::Cycle(node)),
                }
            }
            Some(node) => {
                nodes.push(node);
                current = node;
            }
        }
    }
    PathTrace {
        nodes,
        defect: Some(PathDefect::TooLong),
    }
}

/// Reads routes out of a solution.
///
/// Trucks that never leave the depot get no route. A walk defect, a walk
/// disagreeing with the visit indicators or a destination left unserved is
/// logged and turns the result into a failure.
pub(crate) fn extract(
    built: &RoutingModel,
    input: &CvrpInput,
    config: &RoutingConfig,
    solution: &MipSolution,
) -> CvrpOutput {
    if !solution.has_solution() {
        warn!(status = ?solution.status(), "no routing solution");
        return CvrpOutput::failure();
    }
    if *solution.status() == SolveStatus::TimeLimitWithIncumbent {
        warn!("routing time limit reached, returning best-effort incumbent");
    }

    let tolerance = config.tolerance;
    let evaluator = RouteEvaluator::new(input, config);
    let mut routes = Vec::new();
    let mut served = BTreeSet::new();
    let mut consistent = true;
    for (k, truck) in input.trucks.iter().enumerate() {
        let used: Vec<(usize, usize)> = built
            .arcs
            .range(ArcKey { truck: k, from: 0, to: 0 }..)
            .take_while(|(key, _)| key.truck == k)
            .filter(|(_, vars)| solution.is_set(vars.used, tolerance))
            .map(|(key, _)| (key.from, key.to))
            .collect();

        let trace = trace_path(&used, built.num_nodes);
        if let Some(defect) = trace.defect {
            error!(truck = truck.id(), ?defect, walked = ?trace.nodes, "route reconstruction failed");
            consistent = false;
        }

        let walked: BTreeSet<usize> = trace.nodes.iter().copied().collect();
        let visited: BTreeSet<usize> = (1..built.num_nodes)
            .filter(|&node| {
                built
                    .visits
                    .get(&NodeKey { truck: k, node })
                    .is_some_and(|&v| solution.is_set(v, tolerance))
            })
            .collect();
        if walked != visited {
            error!(
                truck = truck.id(),
                walked = ?walked,
                visited = ?visited,
                "route disagrees with visit indicators"
            );
            consistent = false;
        }

        if trace.nodes.is_empty() {
            continue;
        }
        served.extend(walked);
        let (route, violations) = evaluator.build_route(truck, &trace.nodes);
        for v in &violations {
            warn!(truck = truck.id(), violation = ?v.kind, "route violates a constraint");
        }
        routes.push(route);
    }

    let unserved: Vec<usize> = (1..built.num_nodes).filter(|n| !served.contains(n)).collect();
    if !unserved.is_empty() {
        error!(?unserved, "destinations missing from the extracted routes");
        consistent = false;
    }
    if !consistent {
        return CvrpOutput::failure();
    }

    CvrpOutput::from_routes(routes, solution.objective_value())
}
