//! Tetrahedral volume meshes

use crate::point::*;
use serde::{Deserialize, Serialize};

/// A volumetric decomposition into tetrahedra
///
/// Every tetrahedron `[a, b, c, d]` is positively oriented: `d` lies on the side
/// of triangle `(a, b, c)` its right-handed normal points to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TetrahedralMesh {
    pub vertices: Vec<Point3f>,
    pub tetrahedra: Vec<[usize; 4]>,
}

impl TetrahedralMesh {
    pub fn new(vertices: Vec<Point3f>, tetrahedra: Vec<[usize; 4]>) -> Self {
        Self { vertices, tetrahedra }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn tetra_count(&self) -> usize {
        self.tetrahedra.len()
    }

    /// True when there is no tetrahedron at all
    pub fn is_empty(&self) -> bool {
        self.tetrahedra.is_empty()
    }

    /// Signed volume of one tetrahedron
    pub fn signed_volume(&self, tetra: usize) -> f64 {
        let [a, b, c, d] = self.tetrahedra[tetra];
        let a = to_f64(&self.vertices[a]);
        let ab = to_f64(&self.vertices[b]) - a;
        let ac = to_f64(&self.vertices[c]) - a;
        let ad = to_f64(&self.vertices[d]) - a;
        ab.cross(&ac).dot(&ad) / 6.0
    }

    /// Sum of all tetrahedron volumes
    pub fn total_volume(&self) -> f64 {
        (0..self.tetrahedra.len()).map(|t| self.signed_volume(t)).sum()
    }

    /// The four faces of a tetrahedron, each wound so its normal points outward
    pub fn outward_faces(tetra: &[usize; 4]) -> [[usize; 3]; 4] {
        let [a, b, c, d] = *tetra;
        [[b, c, d], [a, d, c], [a, b, d], [a, c, b]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tetra() -> TetrahedralMesh {
        TetrahedralMesh::new(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_signed_volume() {
        let volume = unit_tetra();
        assert_relative_eq!(volume.signed_volume(0), 1.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(volume.total_volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_outward_faces_point_away_from_opposite_vertex() {
        let volume = unit_tetra();
        let tetra = volume.tetrahedra[0];
        let faces = TetrahedralMesh::outward_faces(&tetra);
        for (face, &opposite) in faces.iter().zip([tetra[0], tetra[1], tetra[2], tetra[3]].iter()) {
            let p0 = to_f64(&volume.vertices[face[0]]);
            let p1 = to_f64(&volume.vertices[face[1]]);
            let p2 = to_f64(&volume.vertices[face[2]]);
            let normal = (p1 - p0).cross(&(p2 - p0));
            let towards = to_f64(&volume.vertices[opposite]) - p0;
            assert!(normal.dot(&towards) < 0.0);
        }
    }
}
