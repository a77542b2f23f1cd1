//! Triangle mesh data structures and topology queries

use crate::point::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
}

/// Undirected edge key with the smaller index first
pub fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Number of faces using each undirected edge
    pub fn edge_face_counts(&self) -> HashMap<(usize, usize), usize> {
        let mut counts = HashMap::new();
        for face in &self.faces {
            for i in 0..3 {
                *counts.entry(edge_key(face[i], face[(i + 1) % 3])).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Number of distinct undirected edges
    pub fn edge_count(&self) -> usize {
        self.edge_face_counts().len()
    }

    /// Edges used by a single face
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_face_counts().values().filter(|&&count| count == 1).count()
    }

    /// Every edge shared by exactly two faces, with consistent winding
    pub fn is_closed_manifold(&self) -> bool {
        if self.faces.is_empty() {
            return false;
        }

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &self.faces {
            for i in 0..3 {
                *directed.entry((face[i], face[(i + 1) % 3])).or_insert(0) += 1;
            }
        }

        directed.iter().all(|(&(a, b), &count)| {
            count == 1 && directed.get(&(b, a)) == Some(&1)
        })
    }

    /// V - E + F
    pub fn euler_characteristic(&self) -> i64 {
        let used = self.used_vertex_count() as i64;
        used - self.edge_count() as i64 + self.faces.len() as i64
    }

    fn used_vertex_count(&self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &v in face {
                used[v] = true;
            }
        }
        used.into_iter().filter(|&u| u).count()
    }

    /// Signed enclosed volume; positive for outward-wound closed meshes
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let a = to_f64(&self.vertices[face[0]]).coords;
                let b = to_f64(&self.vertices[face[1]]).coords;
                let c = to_f64(&self.vertices[face[2]]).coords;
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }

    /// Total triangle area
    pub fn surface_area(&self) -> f64 {
        self.faces
            .iter()
            .map(|face| {
                let a = to_f64(&self.vertices[face[0]]);
                let b = to_f64(&self.vertices[face[1]]);
                let c = to_f64(&self.vertices[face[2]]);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Calculate face normals
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];
                
                let edge1 = v1 - v0;
                let edge2 = v2 - v0;
                
                edge1.cross(&edge2).normalize()
            })
            .collect()
    }

    /// Area-weighted vertex normals, stored on the mesh
    pub fn compute_vertex_normals(&mut self) {
        let mut accumulated = vec![Vector3f::zeros(); self.vertices.len()];
        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let weighted = (self.vertices[face[1]] - v0).cross(&(self.vertices[face[2]] - v0));
            for &v in face {
                accumulated[v] += weighted;
            }
        }

        let normals = accumulated
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::z))
            .collect();
        self.normals = Some(normals);
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.normals = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[1, 2, 3], [0, 3, 2], [0, 1, 3], [0, 2, 1]],
        )
    }

    #[test]
    fn test_closed_tetrahedron_topology() {
        let mesh = tetrahedron();
        assert!(mesh.is_closed_manifold());
        assert_eq!(mesh.edge_count(), 6);
        assert_eq!(mesh.boundary_edge_count(), 0);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_open_mesh_is_not_closed() {
        let mut mesh = tetrahedron();
        mesh.faces.pop();
        assert!(!mesh.is_closed_manifold());
        assert_eq!(mesh.boundary_edge_count(), 3);
    }

    #[test]
    fn test_vertex_normals() {
        let mut mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.compute_vertex_normals();
        let normals = mesh.normals.as_ref().unwrap();
        assert_eq!(normals.len(), 3);
        for n in normals {
            assert_relative_eq!(n.z, 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_surface_area() {
        let mesh = tetrahedron();
        let expected = 1.5 + 3.0_f64.sqrt() / 2.0;
        assert_relative_eq!(mesh.surface_area(), expected, epsilon = 1e-6);
    }
}
