//! Core data structures and traits for markupmodel
//! 
//! This crate provides the fundamental types shared by every stage of the
//! markups-to-model workflow: points and fiducials, point clouds, poly-line
//! cells, tetrahedral volumes, triangle meshes, and the common error type.

pub mod point;
pub mod point_cloud;
pub mod cells;
pub mod volume;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use cells::*;
pub use volume::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix3, Isometry3};
