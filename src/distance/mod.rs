//! Distances between factories.
//!
//! Raw [`Distance`] records arrive in meters; everything downstream works in
//! kilometers, either as a pair lookup ([`DistanceTable`]) or as a dense
//! [`DistanceMatrix`] indexed by node position.

mod edge;
mod matrix;

pub use edge::{Distance, DistanceTable};
pub use matrix::DistanceMatrix;
