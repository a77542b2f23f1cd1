//! Core traits for markupmodel

use crate::{point::*, point_cloud::*, mesh::*, volume::*};

/// Trait for objects with a spatial extent
pub trait Drawable {
    /// Get the bounding box of the object
    fn bounding_box(&self) -> (Point3f, Point3f);
    
    /// Get the center point of the object
    fn center(&self) -> Point3f {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }

    /// Length of the bounding box diagonal
    fn diagonal(&self) -> f32 {
        let (min, max) = self.bounding_box();
        (max - min).norm()
    }
}

/// Axis-aligned bounds of a point sequence; the origin for an empty one
pub fn bounds_of<'a, I>(points: I) -> (Point3f, Point3f)
where
    I: IntoIterator<Item = &'a Point3f>,
{
    let mut iter = points.into_iter();
    let Some(first) = iter.next() else {
        return (Point3f::origin(), Point3f::origin());
    };

    iter.fold((*first, *first), |(min, max), p| (min.inf(p), max.sup(p)))
}

impl Drawable for PointCloud<Point3f> {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.points)
    }
}

impl Drawable for TriangleMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.vertices)
    }
}

impl Drawable for TetrahedralMesh {
    fn bounding_box(&self) -> (Point3f, Point3f) {
        bounds_of(&self.vertices)
    }
}
