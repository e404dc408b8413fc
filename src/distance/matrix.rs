//! Dense distance matrix.

use super::DistanceTable;
use crate::models::Factory;

/// A dense n×n kilometer matrix stored in row-major order.
///
/// Pairs without a known distance hold `f64::INFINITY`; the diagonal is zero.
///
/// # Examples
///
/// ```
/// use u_dispatch::distance::DistanceMatrix;
///
/// let dm = DistanceMatrix::from_rows(vec![
///     vec![0.0, 10.0],
///     vec![12.0, 0.0],
/// ])
/// .unwrap();
/// assert_eq!(dm.get(1, 0), 12.0);
/// assert_eq!(dm.max_finite(), 12.0);
/// assert!(!dm.is_symmetric(1e-9));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a matrix of the given size where every off-diagonal pair is
    /// unreachable.
    pub fn new(size: usize) -> Self {
        let mut data = vec![f64::INFINITY; size * size];
        for i in 0..size {
            data[i * size + i] = 0.0;
        }
        Self { data, size }
    }

    /// Creates a matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Creates a matrix from rows; returns `None` unless the grid is square.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Option<Self> {
        let size = rows.len();
        if rows.iter().any(|r| r.len() != size) {
            return None;
        }
        Self::from_data(size, rows.into_iter().flatten().collect())
    }

    /// Builds the matrix over `factories` in the given order, looking every
    /// pair up in `table`.
    pub fn from_table(table: &DistanceTable, factories: &[Factory]) -> Self {
        let mut dm = Self::new(factories.len());
        for (i, from) in factories.iter().enumerate() {
            for (j, to) in factories.iter().enumerate() {
                if i != j {
                    if let Some(km) = table.get(from.id(), to.id()) {
                        dm.set(i, j, km);
                    }
                }
            }
        }
        dm
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns `true` if a finite distance is known for the pair.
    pub fn is_reachable(&self, from: usize, to: usize) -> bool {
        self.get(from, to).is_finite()
    }

    /// Largest finite distance, or 0 when none is known.
    pub fn max_finite(&self) -> f64 {
        self.data
            .iter()
            .copied()
            .filter(|d| d.is_finite())
            .fold(0.0, f64::max)
    }

    /// Returns `true` if the matrix is symmetric within the given tolerance.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                let (a, b) = (self.get(i, j), self.get(j, i));
                if a.is_finite() != b.is_finite() || (a.is_finite() && (a - b).abs() > tol) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_unreachable_off_diagonal() {
        let dm = DistanceMatrix::new(3);
        assert_eq!(dm.get(1, 1), 0.0);
        assert!(!dm.is_reachable(0, 1));
        assert_eq!(dm.max_finite(), 0.0);
    }

    #[test]
    fn test_from_data_invalid_size() {
        assert!(DistanceMatrix::from_data(2, vec![0.0, 1.0, 2.0]).is_none());
        assert!(DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).is_none());
    }

    #[test]
    fn test_from_table() {
        let mut table = DistanceTable::new();
        table.insert(0, 7, 10.0);
        table.insert(7, 0, 11.0);
        table.insert(7, 9, 4.0);
        let factories = [Factory::depot(0), Factory::new(7, "A"), Factory::new(9, "B")];
        let dm = DistanceMatrix::from_table(&table, &factories);
        assert_eq!(dm.size(), 3);
        assert_eq!(dm.get(0, 1), 10.0);
        assert_eq!(dm.get(1, 0), 11.0);
        assert_eq!(dm.get(1, 2), 4.0);
        assert!(!dm.is_reachable(2, 1));
        assert_eq!(dm.get(2, 2), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let dm = DistanceMatrix::from_rows(vec![
            vec![0.0, 10.0, 15.0],
            vec![10.0, 0.0, 35.0],
            vec![15.0, 35.0, 0.0],
        ])
        .expect("square");
        assert!(dm.is_symmetric(1e-10));
        assert_eq!(dm.max_finite(), 35.0);
    }

    #[test]
    fn test_asymmetric_reachability() {
        let mut dm = DistanceMatrix::new(2);
        dm.set(0, 1, 10.0);
        assert!(!dm.is_symmetric(1e-10));
    }
}
