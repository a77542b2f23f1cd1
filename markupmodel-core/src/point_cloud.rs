//! Point cloud container

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// An ordered point container; index `i` always refers to the `i`-th input point
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud<T> {
    pub points: Vec<T>,
}

/// A point cloud with 3D points
pub type PointCloud3f = PointCloud<Point3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
        }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        Self { points }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a point and return its index
    pub fn push(&mut self, point: T) -> usize {
        self.points.push(point);
        self.points.len() - 1
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }
}

impl PointCloud<Point3f> {
    /// Snapshot the positions of a fiducial list, preserving order
    pub fn from_fiducials(fiducials: &[Fiducial]) -> Self {
        fiducials.iter().map(|f| f.position).collect()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<T> IntoIterator for PointCloud<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            points: Vec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_returns_index() {
        let mut cloud = PointCloud3f::new();
        assert_eq!(cloud.push(Point3f::new(0.0, 0.0, 0.0)), 0);
        assert_eq!(cloud.push(Point3f::new(1.0, 0.0, 0.0)), 1);
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud[1], Point3f::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_from_fiducials_preserves_order() {
        let fiducials = vec![
            Fiducial::new("F-1", Point3f::new(3.0, 0.0, 0.0)),
            Fiducial::new("F-2", Point3f::new(1.0, 0.0, 0.0)),
            Fiducial::new("F-3", Point3f::new(2.0, 0.0, 0.0)),
        ];
        let cloud = PointCloud::from_fiducials(&fiducials);
        let xs: Vec<f32> = cloud.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3.0, 1.0, 2.0]);
    }
}
