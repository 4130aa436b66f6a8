//! Core data structures and traits for meshcorr
//!
//! This crate provides the point types, point sets and the nearest neighbor
//! search trait shared by the correspondence engine and the file readers.

pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
