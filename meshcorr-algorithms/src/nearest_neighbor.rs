//! Nearest neighbor search implementations
//!
//! Both searches order results by squared distance and then by point index,
//! so a query always yields the same sequence no matter how the index is laid
//! out internally. The correspondence solver depends on nothing else.

use meshcorr_core::{
    distance_squared, ensure_finite, Error, NearestNeighborSearch, Point3d, PointSetRole, Result,
};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::debug;

/// Maximum number of points stored in a k-d tree leaf
const LEAF_SIZE: usize = 16;

/// A scored point during a query
#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance_squared: f64,
    index: usize,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_squared
            .total_cmp(&other.distance_squared)
            .then(self.index.cmp(&other.index))
    }
}

fn into_neighbors(mut candidates: Vec<Candidate>) -> Vec<(usize, f64)> {
    candidates.sort_unstable();
    candidates
        .into_iter()
        .map(|c| (c.index, c.distance_squared.sqrt()))
        .collect()
}

/// The k best candidates seen so far, worst on top
struct KBest {
    k: usize,
    heap: BinaryHeap<Candidate>,
}

impl KBest {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    fn offer(&mut self, candidate: Candidate) {
        if self.heap.len() < self.k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    /// Whether a region at squared distance `bound` may still hold a result.
    /// Equality counts: a tied point there could have a lower index.
    fn reaches(&self, bound: f64) -> bool {
        match self.heap.peek() {
            Some(worst) if self.heap.len() >= self.k => bound <= worst.distance_squared,
            _ => true,
        }
    }

    fn into_neighbors(self) -> Vec<(usize, f64)> {
        into_neighbors(self.heap.into_vec())
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    /// Range of `KdTree::order`
    Leaf { start: usize, end: usize },
    /// Points with `coord <= value` on the left, `coord >= value` on the right
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// KD-Tree implementation for nearest neighbor search.
///
/// Splits on the axis of widest extent at the median point. Immutable once
/// built, so a single tree can serve any number of concurrent queries.
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<Point3d>,
    order: Vec<usize>,
    nodes: Vec<Node>,
    root: usize,
}

impl KdTree {
    /// Build a tree over the target points.
    ///
    /// Fails on an empty set and on any non-finite coordinate.
    pub fn new(points: &[Point3d]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyPointSet(PointSetRole::Target));
        }
        ensure_finite(points, PointSetRole::Target)?;

        let mut tree = Self {
            points: points.to_vec(),
            order: (0..points.len()).collect(),
            nodes: Vec::with_capacity(2 * points.len() / LEAF_SIZE + 1),
            root: 0,
        };
        tree.root = tree.build(0, points.len());

        debug!(
            points = tree.points.len(),
            nodes = tree.nodes.len(),
            "built k-d tree"
        );
        Ok(tree)
    }

    /// The indexed points, in their original order
    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    fn push_node(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn build(&mut self, start: usize, end: usize) -> usize {
        if end - start <= LEAF_SIZE {
            return self.push_node(Node::Leaf { start, end });
        }

        let (axis, extent) = self.widest_axis(start, end);
        if extent <= 0.0 {
            // Every point in the range coincides
            return self.push_node(Node::Leaf { start, end });
        }

        let mid = start + (end - start) / 2;
        let points = &self.points;
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            points[a][axis]
                .total_cmp(&points[b][axis])
                .then(a.cmp(&b))
        });
        let value = self.points[self.order[mid]][axis];

        let left = self.build(start, mid);
        let right = self.build(mid, end);
        self.push_node(Node::Split {
            axis,
            value,
            left,
            right,
        })
    }

    fn widest_axis(&self, start: usize, end: usize) -> (usize, f64) {
        let mut min = [f64::INFINITY; 3];
        let mut max = [f64::NEG_INFINITY; 3];
        for &i in &self.order[start..end] {
            let p = &self.points[i];
            for axis in 0..3 {
                min[axis] = min[axis].min(p[axis]);
                max[axis] = max[axis].max(p[axis]);
            }
        }

        (0..3)
            .map(|axis| (axis, max[axis] - min[axis]))
            .fold((0, f64::NEG_INFINITY), |best, current| {
                if current.1 > best.1 {
                    current
                } else {
                    best
                }
            })
    }

    fn search_k(&self, node: usize, query: &Point3d, best: &mut KBest) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &index in &self.order[start..end] {
                    best.offer(Candidate {
                        distance_squared: distance_squared(&self.points[index], query),
                        index,
                    });
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff < 0.0 { (left, right) } else { (right, left) };
                self.search_k(near, query, best);
                if best.reaches(diff * diff) {
                    self.search_k(far, query, best);
                }
            }
        }
    }
}

impl NearestNeighborSearch for KdTree {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let mut best = KBest::new(k.min(self.points.len()));
        self.search_k(self.root, query, &mut best);
        best.into_neighbors()
    }
}

/// Simple brute force nearest neighbor search for small datasets.
///
/// Same ordering contract as [`KdTree`]; used as the reference in tests.
#[derive(Debug, Clone)]
pub struct BruteForceSearch {
    points: Vec<Point3d>,
}

impl BruteForceSearch {
    pub fn new(points: &[Point3d]) -> Result<Self> {
        if points.is_empty() {
            return Err(Error::EmptyPointSet(PointSetRole::Target));
        }
        ensure_finite(points, PointSetRole::Target)?;
        Ok(Self {
            points: points.to_vec(),
        })
    }

    fn scored(&self, query: &Point3d) -> impl Iterator<Item = Candidate> + '_ {
        let query = *query;
        self.points
            .iter()
            .enumerate()
            .map(move |(index, point)| Candidate {
                distance_squared: distance_squared(point, &query),
                index,
            })
    }
}

impl NearestNeighborSearch for BruteForceSearch {
    fn len(&self) -> usize {
        self.points.len()
    }

    fn find_k_nearest(&self, query: &Point3d, k: usize) -> Vec<(usize, f64)> {
        let mut neighbors = into_neighbors(self.scored(query).collect());
        neighbors.truncate(k);
        neighbors
    }
}
