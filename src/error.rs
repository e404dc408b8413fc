//! Error taxonomy for model construction and persistence.
//!
//! Only structural problems are errors. A solver that fails to find a
//! solution is not an error: optimizers report it through `is_success`
//! on their output types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building an optimization model or reading results.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// One or more demands have no feasible start day in the horizon.
    #[error("demands without a feasible start day: {demand_ids:?}")]
    InfeasibleDemands {
        /// Offending demand ids.
        demand_ids: Vec<String>,
    },

    /// The planning horizon contains no days.
    #[error("planning horizon is empty")]
    EmptyHorizon,

    /// The planning horizon is not strictly ascending.
    #[error("planning horizon must be strictly ascending, found {previous} before {next}")]
    UnorderedHorizon {
        /// Earlier position in the list.
        previous: NaiveDate,
        /// Later position in the list.
        next: NaiveDate,
    },

    /// Two trucks share the same id.
    #[error("duplicate truck id {truck_id}")]
    DuplicateTruck {
        /// The repeated id.
        truck_id: usize,
    },

    /// Demands were supplied but no truck can carry them.
    #[error("no trucks supplied for {demands} demand(s)")]
    NoTrucks {
        /// Number of demands waiting for a truck.
        demands: usize,
    },

    /// A demand record is internally inconsistent.
    #[error("invalid demand {demand_id}: {reason}")]
    InvalidDemand {
        /// Demand id.
        demand_id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A distance required by the routing model is unknown.
    #[error("missing distance from node {from} to node {to}")]
    MissingDistance {
        /// Source node index.
        from: usize,
        /// Destination node index.
        to: usize,
    },

    /// The distance matrix does not match the routing node count.
    #[error("distance matrix has {actual} rows, expected {expected}")]
    DistanceMatrixSize {
        /// Depot plus one row per demand.
        expected: usize,
        /// Rows supplied.
        actual: usize,
    },

    /// Consolidation was asked for a day without assignments.
    #[error("no demands assigned on {date}")]
    NoDemandsOnDate {
        /// Requested day.
        date: NaiveDate,
    },

    /// Structured (JSON) encoding or decoding failed.
    #[error("format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = DispatchError::InfeasibleDemands {
            demand_ids: vec!["7".into()],
        };
        assert_eq!(
            err.to_string(),
            "demands without a feasible start day: [\"7\"]"
        );
        assert_eq!(
            DispatchError::NoTrucks { demands: 2 }.to_string(),
            "no trucks supplied for 2 demand(s)"
        );
    }

    #[test]
    fn test_format_error_conversion() {
        let parse: std::result::Result<u32, _> = serde_json::from_str("not json");
        let err: DispatchError = parse.expect_err("invalid json").into();
        assert!(matches!(err, DispatchError::Format(_)));
    }
}
