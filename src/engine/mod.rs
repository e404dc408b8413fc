//! Mixed-integer programming boundary.
//!
//! Optimizers describe their formulation as a [`MipModel`] (plain data:
//! bounded variables, linear constraints, a linear minimization objective)
//! and hand it to a [`MipEngine`]. The engine reports a [`SolveStatus`] and,
//! when a solution exists, one value per variable.
//!
//! [`GoodLpEngine`] is the default engine, backed by `good_lp`.

mod model;
mod solver;

pub use model::{Constraint, LinearExpr, MipModel, Sense, VarDef, VarId, VarKind};
pub use solver::{GoodLpEngine, MipEngine, MipSolution, SolveStatus};
