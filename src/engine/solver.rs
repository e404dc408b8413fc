//! Engine trait, solve outcomes, and the `good_lp` engine.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::{debug, warn};

use super::{LinearExpr, MipModel, Sense, VarId, VarKind};

/// Outcome of one solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// The time limit was hit with a feasible incumbent (best-effort).
    TimeLimitWithIncumbent,
    /// The time limit was hit before any feasible solution.
    TimeLimit,
    /// The model has no feasible solution.
    Infeasible,
    /// The objective is unbounded below.
    Unbounded,
    /// The engine failed.
    Error(String),
}

impl SolveStatus {
    /// Returns `true` if variable values are available.
    pub fn has_solution(&self) -> bool {
        matches!(self, Self::Optimal | Self::TimeLimitWithIncumbent)
    }
}

/// Variable values and status of one solve.
#[derive(Debug, Clone)]
pub struct MipSolution {
    status: SolveStatus,
    values: Vec<f64>,
    objective: f64,
    elapsed: Duration,
}

impl MipSolution {
    /// A solution with one value per model variable.
    pub fn with_values(status: SolveStatus, model: &MipModel, values: Vec<f64>, elapsed: Duration) -> Self {
        let objective = model.objective().evaluate(&values);
        Self {
            status,
            values,
            objective,
            elapsed,
        }
    }

    /// An outcome without values.
    pub fn without_values(status: SolveStatus, elapsed: Duration) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: 0.0,
            elapsed,
        }
    }

    /// Solve status.
    pub fn status(&self) -> &SolveStatus {
        &self.status
    }

    /// Returns `true` if variable values are available.
    pub fn has_solution(&self) -> bool {
        self.status.has_solution() && !self.values.is_empty()
    }

    /// Value of `var`, 0 when no solution exists.
    pub fn value(&self, var: VarId) -> f64 {
        self.values.get(var.index()).copied().unwrap_or(0.0)
    }

    /// Reads a binary as set when its value exceeds `tolerance`.
    pub fn is_set(&self, var: VarId, tolerance: f64) -> bool {
        self.value(var) > tolerance
    }

    /// All values, indexed by [`VarId::index`].
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Objective value, when a solution exists.
    pub fn objective_value(&self) -> Option<f64> {
        self.has_solution().then_some(self.objective)
    }

    /// Evaluates an expression at the solution.
    pub fn evaluate(&self, expr: &LinearExpr) -> f64 {
        expr.evaluate(&self.values)
    }

    /// Wall-clock solve time.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Solves [`MipModel`]s.
///
/// Implementations must return within roughly `time_limit` and never panic
/// on solver failures: every outcome is reported through [`SolveStatus`].
pub trait MipEngine: Send + Sync {
    /// Minimizes the model's objective.
    fn solve(&self, model: &MipModel, time_limit: Duration) -> MipSolution;
}

impl<E: MipEngine + ?Sized> MipEngine for &E {
    fn solve(&self, model: &MipModel, time_limit: Duration) -> MipSolution {
        (**self).solve(model, time_limit)
    }
}

/// Engine backed by `good_lp` with its pure-Rust `microlp` solver.
///
/// The solve runs on a worker thread; when the time limit passes first the
/// call returns [`SolveStatus::TimeLimit`]. `microlp` cannot be interrupted,
/// so the detached worker keeps its CPU core busy until the solve ends on
/// its own and then drops the result with a warning. Callers issuing many
/// short-limit solves should expect such workers to pile up. `microlp`
/// exposes no incumbent, so a time limit never yields values from this
/// engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpEngine;

impl MipEngine for GoodLpEngine {
    fn solve(&self, model: &MipModel, time_limit: Duration) -> MipSolution {
        let started = Instant::now();
        if let Some(name) = model.trivially_infeasible() {
            debug!(model = model.name(), constraint = name, "constant constraint violated");
            return MipSolution::without_values(SolveStatus::Infeasible, started.elapsed());
        }

        let owned = model.clone();
        let (tx, rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(format!("mip-{}", model.name()))
            .spawn(move || {
                let result = solve_with_good_lp(&owned);
                // the receiver is gone once the deadline passed
                if tx.send(result).is_err() {
                    warn!(
                        model = owned.name(),
                        elapsed = ?started.elapsed(),
                        "solve finished after the time limit, result discarded"
                    );
                }
            });
        if let Err(e) = spawned {
            return MipSolution::without_values(SolveStatus::Error(e.to_string()), started.elapsed());
        }

        match rx.recv_timeout(time_limit) {
            Ok(Ok(values)) => {
                MipSolution::with_values(SolveStatus::Optimal, model, values, started.elapsed())
            }
            Ok(Err(status)) => MipSolution::without_values(status, started.elapsed()),
            Err(RecvTimeoutError::Timeout) => {
                warn!(model = model.name(), ?time_limit, "time limit reached without incumbent");
                MipSolution::without_values(SolveStatus::TimeLimit, started.elapsed())
            }
            Err(RecvTimeoutError::Disconnected) => MipSolution::without_values(
                SolveStatus::Error("solver thread terminated".to_string()),
                started.elapsed(),
            ),
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant());
    for &(var, coef) in expr.terms() {
        out += coef * handles[var.index()];
    }
    out
}

fn solve_with_good_lp(model: &MipModel) -> Result<Vec<f64>, SolveStatus> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .vars()
        .iter()
        .map(|def| {
            let declared = match def.kind {
                VarKind::Binary | VarKind::Integer => variable().integer(),
                VarKind::Continuous => variable(),
            };
            vars.add(declared.min(def.lower).max(def.upper))
        })
        .collect();

    let objective = to_expression(model.objective(), &handles);
    let mut problem = vars.minimise(objective).using(default_solver);
    for c in model.constraints() {
        let lhs = to_expression(&c.expr, &handles);
        let rhs = c.rhs;
        problem = match c.sense {
            Sense::Le => problem.with(constraint!(lhs <= rhs)),
            Sense::Ge => problem.with(constraint!(lhs >= rhs)),
            Sense::Eq => problem.with(constraint!(lhs == rhs)),
        };
    }

    match problem.solve() {
        Ok(solution) => Ok(handles.iter().map(|v| solution.value(*v)).collect()),
        Err(ResolutionError::Infeasible) => Err(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolveStatus::Unbounded),
        Err(other) => Err(SolveStatus::Error(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> Duration {
        Duration::from_secs(60)
    }

    #[test]
    fn test_status_has_solution() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::TimeLimitWithIncumbent.has_solution());
        assert!(!SolveStatus::TimeLimit.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Error("x".into()).has_solution());
    }

    #[test]
    fn test_small_knapsack() {
        // maximize 3a + 4b + 5c with weights 2, 3, 4 and capacity 5
        let mut m = MipModel::new("knapsack");
        let a = m.add_binary("a");
        let b = m.add_binary("b");
        let c = m.add_binary("c");
        m.add_le(
            "cap",
            LinearExpr::new()
                .with_term(a, 2.0)
                .with_term(b, 3.0)
                .with_term(c, 4.0),
            5.0,
        );
        m.set_objective(
            LinearExpr::new()
                .with_term(a, -3.0)
                .with_term(b, -4.0)
                .with_term(c, -5.0),
        );
        let sol = GoodLpEngine.solve(&m, limit());
        assert_eq!(sol.status(), &SolveStatus::Optimal);
        assert!(sol.is_set(a, 0.5));
        assert!(sol.is_set(b, 0.5));
        assert!(!sol.is_set(c, 0.5));
        let objective = sol.objective_value().expect("solved");
        assert!((objective + 7.0).abs() < 1e-6);
        assert!(m.violations(sol.values(), 1e-6).is_empty());
    }

    #[test]
    fn test_infeasible_model() {
        let mut m = MipModel::new("infeasible");
        let x = m.add_continuous("x", 0.0, 1.0);
        let y = m.add_continuous("y", 0.0, 1.0);
        m.add_ge("too_much", LinearExpr::new().with_term(x, 1.0).with_term(y, 1.0), 3.0);
        m.set_objective(LinearExpr::new().with_term(x, 1.0));
        let sol = GoodLpEngine.solve(&m, limit());
        assert_eq!(sol.status(), &SolveStatus::Infeasible);
        assert!(!sol.has_solution());
        assert!(sol.objective_value().is_none());
        assert_eq!(sol.value(x), 0.0);
    }

    #[test]
    fn test_trivially_infeasible_skips_solver() {
        let mut m = MipModel::new("constant");
        m.add_eq("never", LinearExpr::new(), 1.0);
        let sol = GoodLpEngine.solve(&m, limit());
        assert_eq!(sol.status(), &SolveStatus::Infeasible);
    }

    #[test]
    fn test_zero_time_limit_returns_without_values() {
        let mut m = MipModel::new("knapsack_40");
        let mut weights = LinearExpr::new();
        let mut objective = LinearExpr::new();
        let items: Vec<VarId> = (0..40)
            .map(|i| {
                let v = m.add_binary(format!("item_{i}"));
                let w = 7.0 + ((i * 13) % 29) as f64;
                weights.add_term(v, w);
                objective.add_term(v, -(w + ((i * 7) % 11) as f64));
                v
            })
            .collect();
        m.add_le("cap", weights, 301.5);
        m.set_objective(objective);

        let sol = GoodLpEngine.solve(&m, Duration::ZERO);
        assert_eq!(sol.status(), &SolveStatus::TimeLimit);
        assert!(sol.objective_value().is_none());
        assert!(items.iter().all(|&v| sol.value(v) == 0.0));

        // the detached worker does not hold up later solves
        let mut small = MipModel::new("single");
        let x = small.add_binary("x");
        small.set_objective(LinearExpr::new().with_term(x, -1.0));
        let sol = GoodLpEngine.solve(&small, limit());
        assert_eq!(sol.status(), &SolveStatus::Optimal);
        assert!(sol.is_set(x, 0.5));
    }
}
