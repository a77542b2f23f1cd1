//! Point types and fiducial markers

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A placed point of interest, as stored in a markups list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fiducial {
    pub label: String,
    pub position: Point3f,
    pub selected: bool,
    pub visible: bool,
}

impl Fiducial {
    /// Create a selected, visible fiducial
    pub fn new(label: impl Into<String>, position: Point3f) -> Self {
        Self {
            label: label.into(),
            position,
            selected: true,
            visible: true,
        }
    }
}

impl Default for Fiducial {
    fn default() -> Self {
        Self::new("F", Point3f::origin())
    }
}

/// Widen a single precision point for geometric predicates
pub fn to_f64(point: &Point3f) -> Point3d {
    Point3d::new(point.x as f64, point.y as f64, point.z as f64)
}
