//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// An RGBA color with 8-bit channels
pub type Rgba = [u8; 4];

/// Color assigned to vertices of files that carry no color
pub const DEFAULT_RGBA: Rgba = [0, 0, 0, 255];

/// Which side of a correspondence run a point set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointSetRole {
    /// Reference model vertices, mapped from
    Source,
    /// Output or scanned mesh vertices, mapped to
    Target,
}

impl fmt::Display for PointSetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointSetRole::Source => f.write_str("source"),
            PointSetRole::Target => f.write_str("target"),
        }
    }
}

/// True when all three coordinates are finite
#[inline]
pub fn is_finite_point(point: &Point3d) -> bool {
    point.x.is_finite() && point.y.is_finite() && point.z.is_finite()
}

/// Euclidean distance between two points
#[inline]
pub fn distance(a: &Point3d, b: &Point3d) -> f64 {
    (a - b).norm()
}

/// Squared Euclidean distance between two points
#[inline]
pub fn distance_squared(a: &Point3d, b: &Point3d) -> f64 {
    (a - b).norm_squared()
}
