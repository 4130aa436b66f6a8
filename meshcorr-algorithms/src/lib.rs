//! # meshcorr algorithms
//!
//! Spatial indexing and vertex correspondence between a reference point set
//! (for example the vertices of a parametric face model) and an independently
//! produced target point set (for example a scanned mesh).
//!
//! The [`KdTree`] answers k-nearest-neighbor queries over the target set, and
//! the [`CorrespondenceSolver`] walks the source set in index order to build
//! either a plain nearest-neighbor mapping or an injective mapping limited by
//! a maximum distance.

pub mod nearest_neighbor;
pub mod usage_mask;
pub mod correspondence;
pub mod correspondence_set;

// Re-export commonly used items
pub use nearest_neighbor::*;
pub use usage_mask::*;
pub use correspondence::*;
pub use correspondence_set::*;
