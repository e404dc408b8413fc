//! Whole-result checks for routing outputs.

use std::collections::HashMap;

use tracing::warn;

use super::RouteEvaluator;
use crate::config::RoutingConfig;
use crate::models::{CvrpInput, CvrpOutput, Violation, ViolationType};

/// Checks every route of `output` against `input`.
///
/// Reports routes not closed at the depot, destinations served twice or
/// never, and, by replaying each route through [`RouteEvaluator`], capacity,
/// stop-count and (when enabled) arrival-window violations. A failed output
/// has nothing to check.
pub fn validate_routes(
    output: &CvrpOutput,
    input: &CvrpInput,
    config: &RoutingConfig,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    if !output.is_success {
        return violations;
    }

    let evaluator = RouteEvaluator::new(input, config);
    // destination id -> node indices not yet served
    let mut open: HashMap<usize, Vec<usize>> = HashMap::new();
    for (node, factory) in evaluator.nodes().iter().enumerate().skip(1).rev() {
        open.entry(factory.id()).or_default().push(node);
    }

    for route in &output.routes {
        let closed = route.route().len() >= 2
            && [route.route().first(), route.route().last()]
                .iter()
                .all(|end| end.is_some_and(|f| f.is_depot() && f.id() == config.depot_id));
        if !closed {
            violations.push(Violation::new(ViolationType::DepotNotClosed {
                truck_id: route.truck().id(),
            }));
            continue;
        }

        let mut stops = Vec::with_capacity(route.stops());
        for factory in route.stops_visited() {
            match open.get_mut(&factory.id()).and_then(Vec::pop) {
                Some(node) => stops.push(node),
                None => violations.push(Violation::new(ViolationType::DuplicateVisit {
                    factory_id: factory.id(),
                })),
            }
        }
        let (_, replayed) = evaluator.build_route(route.truck(), &stops);
        violations.extend(replayed);
    }

    let mut missing: Vec<usize> = open
        .iter()
        .flat_map(|(&id, nodes)| std::iter::repeat(id).take(nodes.len()))
        .collect();
    missing.sort_unstable();
    violations.extend(
        missing
            .into_iter()
            .map(|factory_id| Violation::new(ViolationType::MissingVisit { factory_id })),
    );

    if !violations.is_empty() {
        warn!(count = violations.len(), "routing result has violations");
    }
    violations
}
