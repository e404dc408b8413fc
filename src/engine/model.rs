//! Solver-independent MIP model description.

/// Handle of a variable inside one [`MipModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    /// Position of the variable in the model.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Integer,
    Continuous,
}

/// A declared variable with its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
}

/// A linear expression `Σ coef·var + constant`.
///
/// # Examples
///
/// ```
/// use u_dispatch::engine::{LinearExpr, MipModel};
///
/// let mut model = MipModel::new("demo");
/// let x = model.add_binary("x");
/// let y = model.add_continuous("y", 0.0, 10.0);
/// let expr = LinearExpr::new().with_term(x, 2.0).with_term(y, 1.0).with_constant(3.0);
/// assert_eq!(expr.evaluate(&[1.0, 4.0]), 9.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinearExpr {
    /// Creates the zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `coef·var`.
    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Adds a constant.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant += constant;
        self
    }

    /// Adds `coef·var` in place; zero coefficients are dropped.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    /// Appends every term and the constant of `other`.
    pub fn extend(&mut self, other: &LinearExpr) {
        self.terms.extend_from_slice(&other.terms);
        self.constant += other.constant;
    }

    /// The `(variable, coefficient)` terms.
    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    /// The constant part.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Returns `true` if the expression has no variable terms.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression for one value per model variable.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coef)| coef * values.get(var.index()).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        let mut expr = LinearExpr::new();
        for (var, coef) in iter {
            expr.add_term(var, coef);
        }
        expr
    }
}

/// Relation between a constraint's expression and its right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// A linear constraint `expr (<=|>=|==) rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
    pub rhs: f64,
}

impl Constraint {
    /// Checks the constraint within `tol`.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// A minimization MIP.
///
/// Constraints whose expression has no variable terms are evaluated at
/// insertion: satisfied ones are dropped, violated ones mark the model
/// infeasible without reaching a solver.
#[derive(Debug, Clone)]
pub struct MipModel {
    name: String,
    vars: Vec<VarDef>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
    trivially_infeasible: Option<String>,
}

impl MipModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            constraints: Vec::new(),
            objective: LinearExpr::new(),
            trivially_infeasible: None,
        }
    }

    /// Declares a variable.
    pub fn add_var(&mut self, def: VarDef) -> VarId {
        self.vars.push(def);
        VarId(self.vars.len() - 1)
    }

    /// Declares a 0/1 variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(VarDef {
            name: name.into(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
        })
    }

    /// Declares a bounded continuous variable.
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(VarDef {
            name: name.into(),
            kind: VarKind::Continuous,
            lower,
            upper,
        })
    }

    /// Declares a bounded integer variable.
    pub fn add_integer(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_var(VarDef {
            name: name.into(),
            kind: VarKind::Integer,
            lower,
            upper,
        })
    }

    /// Fixes a variable to `value` through its bounds.
    pub fn fix(&mut self, var: VarId, value: f64) {
        let def = &mut self.vars[var.index()];
        def.lower = value;
        def.upper = value;
    }

    /// Adds `expr <= rhs`.
    pub fn add_le(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: f64) {
        self.add_constraint(name.into(), expr, Sense::Le, rhs);
    }

    /// Adds `expr >= rhs`.
    pub fn add_ge(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: f64) {
        self.add_constraint(name.into(), expr, Sense::Ge, rhs);
    }

    /// Adds `expr == rhs`.
    pub fn add_eq(&mut self, name: impl Into<String>, expr: LinearExpr, rhs: f64) {
        self.add_constraint(name.into(), expr, Sense::Eq, rhs);
    }

    /// Adds `expr <= rhs` active only when the binary `indicator` is 1:
    /// `expr + big_m·indicator <= rhs + big_m`.
    pub fn add_indicator_le(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        rhs: f64,
        indicator: VarId,
        big_m: f64,
    ) {
        let relaxed = expr.with_term(indicator, big_m);
        self.add_le(name, relaxed, rhs + big_m);
    }

    /// Adds `expr >= rhs` active only when the binary `indicator` is 1:
    /// `expr - big_m·indicator >= rhs - big_m`.
    pub fn add_indicator_ge(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        rhs: f64,
        indicator: VarId,
        big_m: f64,
    ) {
        let relaxed = expr.with_term(indicator, -big_m);
        self.add_ge(name, relaxed, rhs - big_m);
    }

    fn add_constraint(&mut self, name: String, expr: LinearExpr, sense: Sense, rhs: f64) {
        // constants move to the right-hand side
        let rhs = rhs - expr.constant();
        let expr = LinearExpr {
            terms: expr.terms,
            constant: 0.0,
        };
        let constraint = Constraint {
            name,
            expr,
            sense,
            rhs,
        };
        if constraint.expr.is_constant() {
            if !constraint.is_satisfied(&[], 1e-9) && self.trivially_infeasible.is_none() {
                self.trivially_infeasible = Some(constraint.name);
            }
            return;
        }
        self.constraints.push(constraint);
    }

    /// Sets the expression to minimize.
    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared variables, indexed by [`VarId::index`].
    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    /// Definition of one variable.
    pub fn var(&self, var: VarId) -> &VarDef {
        &self.vars[var.index()]
    }

    /// Non-trivial constraints.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// The minimization objective.
    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of binary variables.
    pub fn num_binaries(&self) -> usize {
        self.vars
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    /// Number of non-trivial constraints.
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Name of the first constant constraint found violated, if any.
    pub fn trivially_infeasible(&self) -> Option<&str> {
        self.trivially_infeasible.as_deref()
    }

    /// Constraints and bounds violated by `values`, by name.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<&str> {
        let bounds = self.vars.iter().zip(values).filter_map(|(def, &v)| {
            (v < def.lower - tol || v > def.upper + tol).then_some(def.name.as_str())
        });
        let rows = self
            .constraints
            .iter()
            .filter(|c| !c.is_satisfied(values, tol))
            .map(|c| c.name.as_str());
        bounds.chain(rows).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_and_count() {
        let mut m = MipModel::new("t");
        let x = m.add_binary("x");
        let y = m.add_continuous("y", 0.0, 5.0);
        let z = m.add_integer("z", 0.0, 3.0);
        m.add_le("c", LinearExpr::new().with_term(x, 1.0).with_term(y, 1.0), 4.0);
        assert_eq!(m.num_vars(), 3);
        assert_eq!(m.num_binaries(), 1);
        assert_eq!(m.num_constraints(), 1);
        assert_eq!(m.var(z).kind, VarKind::Integer);
    }

    #[test]
    fn test_constant_moves_to_rhs() {
        let mut m = MipModel::new("t");
        let x = m.add_continuous("x", 0.0, 10.0);
        m.add_ge("c", LinearExpr::new().with_term(x, 1.0).with_constant(2.0), 5.0);
        let c = &m.constraints()[0];
        assert_eq!(c.rhs, 3.0);
        assert!(c.is_satisfied(&[3.0], 1e-9));
        assert!(!c.is_satisfied(&[2.5], 1e-9));
    }

    #[test]
    fn test_trivial_constraints() {
        let mut m = MipModel::new("t");
        m.add_le("ok", LinearExpr::new(), 1.0);
        assert_eq!(m.num_constraints(), 0);
        assert!(m.trivially_infeasible().is_none());
        m.add_eq("bad", LinearExpr::new(), 1.0);
        assert_eq!(m.trivially_infeasible(), Some("bad"));
    }

    #[test]
    fn test_indicator_le() {
        let mut m = MipModel::new("t");
        let x = m.add_continuous("x", 0.0, 100.0);
        let on = m.add_binary("on");
        m.add_indicator_le("ind", LinearExpr::new().with_term(x, 1.0), 10.0, on, 100.0);
        let c = &m.constraints()[0];
        assert!(c.is_satisfied(&[50.0, 0.0], 1e-9));
        assert!(!c.is_satisfied(&[50.0, 1.0], 1e-9));
        assert!(c.is_satisfied(&[10.0, 1.0], 1e-9));
    }

    #[test]
    fn test_violations_report_bounds_and_rows() {
        let mut m = MipModel::new("t");
        let x = m.add_continuous("x", 0.0, 1.0);
        m.add_le("row", LinearExpr::new().with_term(x, 1.0), 0.5);
        assert!(m.violations(&[0.2], 1e-9).is_empty());
        assert_eq!(m.violations(&[0.8], 1e-9), vec!["row"]);
        assert_eq!(m.violations(&[2.0], 1e-9), vec!["x", "row"]);
    }

    #[test]
    fn test_fix() {
        let mut m = MipModel::new("t");
        let x = m.add_binary("x");
        m.fix(x, 0.0);
        assert_eq!(m.var(x).upper, 0.0);
    }
}
