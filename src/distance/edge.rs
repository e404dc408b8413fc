//! Directed distance records and the pairwise lookup built from them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Factory;

/// A directed edge `source -> destination` with its length in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub source: Factory,
    pub destination: Factory,
    pub distance_m: f64,
}

impl Distance {
    /// Creates a distance record.
    pub fn new(source: Factory, destination: Factory, distance_m: f64) -> Self {
        Self {
            source,
            destination,
            distance_m,
        }
    }

    /// Converts meters to kilometers.
    pub fn to_km(distance_m: f64) -> f64 {
        distance_m / 1000.0
    }

    /// Edge length in kilometers.
    pub fn distance_km(&self) -> f64 {
        Self::to_km(self.distance_m)
    }
}

/// Kilometer distances keyed by `(source id, destination id)`.
///
/// # Examples
///
/// ```
/// use u_dispatch::distance::{Distance, DistanceTable};
/// use u_dispatch::models::Factory;
///
/// let table = DistanceTable::from_distances(&[Distance::new(
///     Factory::depot(0),
///     Factory::new(1, "A"),
///     12_500.0,
/// )]);
/// assert_eq!(table.get(0, 1), Some(12.5));
/// assert_eq!(table.get(1, 0), None);
/// assert_eq!(table.get(1, 1), Some(0.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DistanceTable {
    km: HashMap<(usize, usize), f64>,
}

impl DistanceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the table from meter records. Non-finite or negative lengths
    /// are skipped.
    pub fn from_distances(distances: &[Distance]) -> Self {
        let mut table = Self::new();
        for d in distances {
            if d.distance_m.is_finite() && d.distance_m >= 0.0 {
                table.insert(d.source.id(), d.destination.id(), d.distance_km());
            }
        }
        table
    }

    /// Records a distance in kilometers.
    pub fn insert(&mut self, from: usize, to: usize, km: f64) {
        self.km.insert((from, to), km);
    }

    /// Distance in kilometers; a factory is always at distance 0 from itself.
    pub fn get(&self, from: usize, to: usize) -> Option<f64> {
        if from == to {
            return Some(0.0);
        }
        self.km.get(&(from, to)).copied()
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.km.len()
    }

    /// Returns `true` if no pair is stored.
    pub fn is_empty(&self) -> bool {
        self.km.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_km() {
        let d = Distance::new(Factory::new(1, "A"), Factory::new(2, "B"), 2500.0);
        assert!((d.distance_km() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_table_skips_invalid_records() {
        let a = Factory::new(1, "A");
        let b = Factory::new(2, "B");
        let table = DistanceTable::from_distances(&[
            Distance::new(a.clone(), b.clone(), 1000.0),
            Distance::new(b.clone(), a.clone(), f64::NAN),
            Distance::new(b, a, -5.0),
        ]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(1, 2), Some(1.0));
        assert_eq!(table.get(2, 1), None);
    }
}
