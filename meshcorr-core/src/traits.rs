//! Core traits for meshcorr

use crate::point::Point3d;

/// Trait for nearest neighbor search over a fixed set of points.
///
/// Results are `(index, distance)` pairs sorted by ascending distance, with
/// equal distances ordered by ascending index. Implementations must return
/// identical results for identical queries so that callers relying on result
/// order stay deterministic.
pub trait NearestNeighborSearch {
    /// Number of indexed points
    fn len(&self) -> usize;

    /// Whether the index holds no points
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the k nearest neighbors to a query point.
    ///
    /// Returns all points when `k` exceeds [`len`](Self::len).
    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)>;

    /// The single nearest neighbor, if any
    fn find_nearest(&self, query: &Point3d) -> Option<(usize, f64)> {
        self.find_k_nearest(query, 1).into_iter().next()
    }
}
