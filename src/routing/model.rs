//! Routing MIP construction.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::config::RoutingConfig;
use crate::engine::{LinearExpr, MipModel, VarId};
use crate::error::{DispatchError, Result};
use crate::models::{CvrpInput, TimeWindow};

/// Key of an arc variable: `from -> to` driven by truck position `truck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArcKey {
    pub truck: usize,
    pub from: usize,
    pub to: usize,
}

/// Key of a per-node, per-truck variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub truck: usize,
    pub node: usize,
}

/// Arc indicator, on-board load and remaining stop count of one arc.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArcVars {
    pub(crate) used: VarId,
    pub(crate) flow: VarId,
    pub(crate) count: VarId,
}

/// The routing MIP together with the maps from domain keys to variables.
#[derive(Debug, Clone)]
pub struct RoutingModel {
    pub(crate) model: MipModel,
    pub(crate) arcs: BTreeMap<ArcKey, ArcVars>,
    pub(crate) visits: BTreeMap<NodeKey, VarId>,
    pub(crate) arrivals: BTreeMap<NodeKey, VarId>,
    pub(crate) num_nodes: usize,
}

impl RoutingModel {
    /// Builds the model, rejecting structurally invalid inputs.
    ///
    /// Fails when the matrix size does not match `1 + demands`, when a
    /// destination cannot be reached from or return to the depot, when
    /// demands exist without trucks, or on invalid records.
    pub fn build(input: &CvrpInput, config: &RoutingConfig) -> Result<Self> {
        let n = input.num_nodes();
        let matrix = &input.distance_matrix;
        if matrix.size() != n {
            return Err(DispatchError::DistanceMatrixSize {
                expected: n,
                actual: matrix.size(),
            });
        }
        if input.trucks.is_empty() && !input.demands.is_empty() {
            return Err(DispatchError::NoTrucks {
                demands: input.demands.len(),
            });
        }
        let mut seen = HashSet::new();
        for truck in &input.trucks {
            if !seen.insert(truck.id()) {
                return Err(DispatchError::DuplicateTruck {
                    truck_id: truck.id(),
                });
            }
        }
        input.demands.iter().try_for_each(|d| d.validate())?;
        for node in 1..n {
            if !matrix.is_reachable(0, node) {
                return Err(DispatchError::MissingDistance { from: 0, to: node });
            }
            if !matrix.is_reachable(node, 0) {
                return Err(DispatchError::MissingDistance { from: node, to: 0 });
            }
        }

        let q = input.node_loads();
        let max_count = n.saturating_sub(1) as f64;
        let max_distance = matrix.max_finite();
        let scale = if config.normalize_distances && max_distance > 0.0 {
            1.0 / max_distance
        } else {
            1.0
        };

        let mut model = MipModel::new("cvrp");
        let mut arcs = BTreeMap::new();
        let mut visits = BTreeMap::new();
        let mut objective = LinearExpr::new();

        for (k, truck) in input.trucks.iter().enumerate() {
            let capacity = truck.capacity();
            for node in 1..n {
                let v = model.add_binary(format!("visit_{node}_{k}"));
                visits.insert(NodeKey { truck: k, node }, v);
                objective.add_term(v, config.service_cost);
            }
            for from in 0..n {
                for to in (0..n).filter(|&to| to != from) {
                    // arcs that cannot carry both end loads are left out
                    if !matrix.is_reachable(from, to) || q[from] + q[to] > capacity + 1e-9 {
                        continue;
                    }
                    let used = model.add_binary(format!("x_{from}_{to}_{k}"));
                    let upper = if to == 0 { 0.0 } else { capacity - q[from] };
                    let flow = model.add_continuous(format!("f_{from}_{to}_{k}"), 0.0, upper);
                    model.add_ge(
                        format!("flow_lo_{from}_{to}_{k}"),
                        LinearExpr::new().with_term(flow, 1.0).with_term(used, -q[to]),
                        0.0,
                    );
                    model.add_le(
                        format!("flow_hi_{from}_{to}_{k}"),
                        LinearExpr::new().with_term(flow, 1.0).with_term(used, -upper),
                        0.0,
                    );
                    // stops still ahead; falls by one per visit, so even
                    // zero-weight stops cannot close a cycle off the depot
                    let count_upper = if to == 0 { 0.0 } else { max_count };
                    let count = model.add_continuous(format!("c_{from}_{to}_{k}"), 0.0, count_upper);
                    if to != 0 {
                        model.add_ge(
                            format!("count_lo_{from}_{to}_{k}"),
                            LinearExpr::new().with_term(count, 1.0).with_term(used, -1.0),
                            0.0,
                        );
                        model.add_le(
                            format!("count_hi_{from}_{to}_{k}"),
                            LinearExpr::new().with_term(count, 1.0).with_term(used, -count_upper),
                            0.0,
                        );
                    }
                    objective.add_term(used, truck.cost() * matrix.get(from, to) * scale);
                    objective.add_term(flow, config.flow_weight / capacity.max(1.0));
                    arcs.insert(ArcKey { truck: k, from, to }, ArcVars { used, flow, count });
                }
            }
        }

        for node in 1..n {
            let once: LinearExpr = (0..input.trucks.len())
                .map(|k| (visits[&NodeKey { truck: k, node }], 1.0))
                .collect();
            model.add_eq(format!("visit_once_{node}"), once, 1.0);
        }

        for k in 0..input.trucks.len() {
            let arcs_of = |select: &dyn Fn(&ArcKey) -> bool| -> Vec<ArcVars> {
                arcs.iter()
                    .filter(|(key, _)| key.truck == k && select(key))
                    .map(|(_, vars)| *vars)
                    .collect()
            };

            let leave = arcs_of(&|a: &ArcKey| a.from == 0);
            let back = arcs_of(&|a: &ArcKey| a.to == 0);
            let out: LinearExpr = leave.iter().map(|a| (a.used, 1.0)).collect();
            let into: LinearExpr = back.iter().map(|a| (a.used, 1.0)).collect();
            model.add_le(format!("depot_out_{k}"), out.clone(), 1.0);
            model.add_le(format!("depot_in_{k}"), into.clone(), 1.0);
            let mut balance = out;
            for &(var, coef) in into.terms() {
                balance.add_term(var, -coef);
            }
            model.add_eq(format!("depot_balance_{k}"), balance, 0.0);

            let mut stops = LinearExpr::new();
            for node in 1..n {
                let v = visits[&NodeKey { truck: k, node }];
                stops.add_term(v, 1.0);
                let incoming = arcs_of(&|a: &ArcKey| a.to == node);
                let outgoing = arcs_of(&|a: &ArcKey| a.from == node);

                let mut deg_in: LinearExpr = incoming.iter().map(|a| (a.used, 1.0)).collect();
                deg_in.add_term(v, -1.0);
                model.add_eq(format!("in_degree_{node}_{k}"), deg_in, 0.0);
                let mut deg_out: LinearExpr = outgoing.iter().map(|a| (a.used, 1.0)).collect();
                deg_out.add_term(v, -1.0);
                model.add_eq(format!("out_degree_{node}_{k}"), deg_out, 0.0);

                let mut conservation: LinearExpr = incoming.iter().map(|a| (a.flow, 1.0)).collect();
                for a in &outgoing {
                    conservation.add_term(a.flow, -1.0);
                }
                conservation.add_term(v, -q[node]);
                model.add_eq(format!("flow_{node}_{k}"), conservation, 0.0);

                let mut counted: LinearExpr = incoming.iter().map(|a| (a.count, 1.0)).collect();
                for a in &outgoing {
                    counted.add_term(a.count, -1.0);
                }
                counted.add_term(v, -1.0);
                model.add_eq(format!("count_{node}_{k}"), counted, 0.0);
            }
            model.add_le(format!("max_stops_{k}"), stops, config.max_stops as f64);
        }

        let mut arrivals = BTreeMap::new();
        if config.time_windows {
            add_arrival_windows(&mut model, input, config, &arcs, &visits, &mut arrivals);
        }

        model.set_objective(objective);
        debug!(
            nodes = n,
            trucks = input.trucks.len(),
            arcs = arcs.len(),
            vars = model.num_vars(),
            constraints = model.num_constraints(),
            time_windows = config.time_windows,
            "routing model built"
        );

        Ok(Self {
            model,
            arcs,
            visits,
            arrivals,
            num_nodes: n,
        })
    }

    /// The underlying MIP.
    pub fn model(&self) -> &MipModel {
        &self.model
    }

    /// Arc indicator of a key, if the arc exists.
    pub fn arc_var(&self, key: &ArcKey) -> Option<VarId> {
        self.arcs.get(key).map(|a| a.used)
    }

    /// Visit indicator of a key.
    pub fn visit_var(&self, key: &NodeKey) -> Option<VarId> {
        self.visits.get(key).copied()
    }

    /// Arrival clock of a key, present only with arrival windows.
    pub fn arrival_var(&self, key: &NodeKey) -> Option<VarId> {
        self.arrivals.get(key).copied()
    }

    /// Number of arc indicators.
    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }
}

/// Adds arrival clocks and their propagation along used arcs.
///
/// Clocks live in `[lo, hi]`, the union of the depot departure and all node
/// windows. A destination without a window on the routing day gets the
/// latest arrival any route could reach. The big-M of a truck is the span
/// `hi - lo` plus its longest leg, the service time and the margin.
fn add_arrival_windows(
    model: &mut MipModel,
    input: &CvrpInput,
    config: &RoutingConfig,
    arcs: &BTreeMap<ArcKey, ArcVars>,
    visits: &BTreeMap<NodeKey, VarId>,
    arrivals: &mut BTreeMap<NodeKey, VarId>,
) {
    let n = input.num_nodes();
    let matrix = &input.distance_matrix;
    let departure = config.departure_minutes;
    let service = config.service_time_minutes;
    let windows = input.node_windows();

    for (k, truck) in input.trucks.iter().enumerate() {
        let max_leg = truck.travel_minutes(matrix.max_finite());
        let reach = departure + (n as f64) * (max_leg + service);
        let Some(open) = TimeWindow::new(0.0, reach) else {
            warn!(truck = truck.id(), reach, "no finite arrival horizon, windows skipped");
            continue;
        };
        let node_windows: Vec<TimeWindow> = windows.iter().map(|w| w.unwrap_or(open)).collect();
        let lo = node_windows[1..]
            .iter()
            .map(TimeWindow::ready)
            .fold(departure, f64::min);
        let hi = node_windows[1..]
            .iter()
            .map(TimeWindow::due)
            .fold(departure, f64::max);
        let big_m = (hi - lo) + max_leg + service + config.big_m_margin_minutes;

        for node in 1..n {
            let a = model.add_continuous(format!("arrival_{node}_{k}"), lo, hi);
            arrivals.insert(NodeKey { truck: k, node }, a);
            let v = visits[&NodeKey { truck: k, node }];
            let window = node_windows[node];
            model.add_ge(
                format!("ready_{node}_{k}"),
                LinearExpr::new().with_term(a, 1.0).with_term(v, -window.ready()),
                0.0,
            );
            model.add_indicator_le(
                format!("due_{node}_{k}"),
                LinearExpr::new().with_term(a, 1.0),
                window.due(),
                v,
                big_m,
            );
        }

        for (key, vars) in arcs.iter().filter(|(key, _)| key.truck == k && key.to != 0) {
            let travel = truck.travel_minutes(matrix.get(key.from, key.to));
            let to = arrivals[&NodeKey { truck: k, node: key.to }];
            let mut expr = LinearExpr::new().with_term(to, 1.0);
            // the depot clock is the fixed departure
            let rhs = if key.from == 0 {
                departure + travel
            } else {
                expr.add_term(arrivals[&NodeKey { truck: k, node: key.from }], -1.0);
                service + travel
            };
            model.add_indicator_ge(
                format!("arrival_{}_{}_{k}", key.from, key.to),
                expr,
                rhs,
                vars.used,
                big_m,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use crate::models::{Demand, Factory, Truck};
    use chrono::NaiveDate;

    fn demand(id: &str, weight: f64, dest: usize) -> Demand {
        let at = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .expect("valid");
        Demand::new(id, weight, 1.0, Factory::new(dest, "X"), at, at + chrono::Duration::hours(9))
    }

    fn matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 10.0, 15.0, 20.0],
            vec![10.0, 0.0, 35.0, 25.0],
            vec![15.0, 35.0, 0.0, 30.0],
            vec![20.0, 25.0, 30.0, 0.0],
        ])
        .expect("square")
    }

    fn input() -> CvrpInput {
        CvrpInput::new(
            vec![demand("1", 5.0, 1), demand("2", 3.0, 2), demand("3", 4.0, 3)],
            vec![Truck::new(1, 10.0, 10.0), Truck::new(2, 8.0, 10.0)],
            matrix(),
        )
    }

    #[test]
    fn test_variable_layout() {
        let built = RoutingModel::build(&input(), &RoutingConfig::default()).expect("valid");
        // 12 directed arcs per truck, minus 1 -> 3 and 3 -> 1 on the 8-capacity truck
        assert_eq!(built.num_arcs(), 22);
        assert!(built.arc_var(&ArcKey { truck: 0, from: 1, to: 3 }).is_some());
        assert!(built.arc_var(&ArcKey { truck: 1, from: 1, to: 3 }).is_none());
        assert!(built.visit_var(&NodeKey { truck: 1, node: 3 }).is_some());
        assert!(built.visit_var(&NodeKey { truck: 1, node: 0 }).is_none());
        assert!(built.arrival_var(&NodeKey { truck: 0, node: 1 }).is_none());
    }

    #[test]
    fn test_depot_inflow_is_empty() {
        let built = RoutingModel::build(&input(), &RoutingConfig::default()).expect("valid");
        let flow = built.arcs[&ArcKey { truck: 0, from: 2, to: 0 }].flow;
        assert_eq!(built.model().var(flow).upper, 0.0);
        let flow = built.arcs[&ArcKey { truck: 0, from: 0, to: 2 }].flow;
        assert_eq!(built.model().var(flow).upper, 10.0);
    }

    #[test]
    fn test_stop_count_bounds() {
        let built = RoutingModel::build(&input(), &RoutingConfig::default()).expect("valid");
        let out = built.arcs[&ArcKey { truck: 0, from: 0, to: 2 }].count;
        assert_eq!(built.model().var(out).upper, 3.0);
        let back = built.arcs[&ArcKey { truck: 0, from: 2, to: 0 }].count;
        assert_eq!(built.model().var(back).upper, 0.0);
        let names: Vec<&str> = built.model().constraints().iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"count_2_0"));
        assert!(names.contains(&"count_lo_1_2_0"));
    }

    #[test]
    fn test_time_window_rows() {
        let config = RoutingConfig::default().with_time_windows(true);
        let built = RoutingModel::build(&input(), &config).expect("valid");
        assert!(built.arrival_var(&NodeKey { truck: 1, node: 2 }).is_some());
        let names: Vec<&str> = built.model().constraints().iter().map(|c| c.name.as_str()).collect();
        assert!(names.contains(&"due_2_1"));
        assert!(names.contains(&"arrival_0_2_1"));
        assert!(names.contains(&"arrival_3_2_0"));
    }

    #[test]
    fn test_matrix_size_mismatch() {
        let mut bad = input();
        bad.distance_matrix = DistanceMatrix::new(3);
        let err = RoutingModel::build(&bad, &RoutingConfig::default()).expect_err("size");
        assert!(matches!(
            err,
            DispatchError::DistanceMatrixSize { expected: 4, actual: 3 }
        ));
    }

    #[test]
    fn test_missing_depot_distance() {
        let mut bad = input();
        bad.distance_matrix.set(2, 0, f64::INFINITY);
        let err = RoutingModel::build(&bad, &RoutingConfig::default()).expect_err("missing");
        assert!(matches!(err, DispatchError::MissingDistance { from: 2, to: 0 }));
    }

    #[test]
    fn test_no_trucks() {
        let mut bad = input();
        bad.trucks.clear();
        let err = RoutingModel::build(&bad, &RoutingConfig::default()).expect_err("no trucks");
        assert!(matches!(err, DispatchError::NoTrucks { demands: 3 }));
    }

    #[test]
    fn test_empty_day_builds_empty_model() {
        let empty = CvrpInput::new(vec![], vec![], DistanceMatrix::new(1));
        let built = RoutingModel::build(&empty, &RoutingConfig::default()).expect("valid");
        assert_eq!(built.num_arcs(), 0);
        assert_eq!(built.model().num_vars(), 0);
    }
}
