//! Butterfly subdivision smoothing
//!
//! Interpolating subdivision in the modified butterfly form: original vertices
//! never move, and every edge gains one new vertex computed from a stencil of
//! its neighbourhood. Each pass splits every triangle into four.
//!
//! Stencils, by edge neighbourhood:
//! - both endpoints interior with valence 6: the classic 8-point butterfly
//! - one interior endpoint of other valence: that vertex's valence-k weights
//! - both interior and extraordinary: the average of both
//! - boundary edge: the 4-point curve scheme along the boundary
//! - anything else: the edge midpoint

use markupmodel_core::{edge_key, to_f64, Error, Point3d, Point3f, Result, TriangleMesh, Vector3d};
use rayon::prelude::*;
use std::collections::HashMap;
use std::f64::consts::PI;

/// Connectivity needed to evaluate the butterfly stencils
struct Topology {
    /// `(v, a) -> b` for every face wound `(v, a, b)`
    next: HashMap<(usize, usize), usize>,
    /// Faces per undirected edge
    edge_faces: HashMap<(usize, usize), usize>,
    /// Neighbours along boundary edges
    boundary_neighbors: HashMap<usize, Vec<usize>>,
    face_count: usize,
}

impl Topology {
    fn build(mesh: &TriangleMesh) -> Self {
        let mut next = HashMap::with_capacity(mesh.faces.len() * 3);
        for &[a, b, c] in &mesh.faces {
            next.insert((a, b), c);
            next.insert((b, c), a);
            next.insert((c, a), b);
        }

        let edge_faces = mesh.edge_face_counts();

        let mut boundary_neighbors: HashMap<usize, Vec<usize>> = HashMap::new();
        for (&(a, b), &count) in &edge_faces {
            if count == 1 {
                boundary_neighbors.entry(a).or_default().push(b);
                boundary_neighbors.entry(b).or_default().push(a);
            }
        }

        Self {
            next,
            edge_faces,
            boundary_neighbors,
            face_count: mesh.faces.len(),
        }
    }

    /// Neighbours of `v` in winding order starting at `start`, if the fan closes
    fn closed_ring(&self, v: usize, start: usize) -> Option<Vec<usize>> {
        let mut ring = vec![start];
        let mut current = start;
        loop {
            let following = *self.next.get(&(v, current))?;
            if following == start {
                return Some(ring);
            }
            // A fan longer than the face count never closes.
            if ring.len() > self.face_count {
                return None;
            }
            ring.push(following);
            current = following;
        }
    }

    fn other_boundary_neighbor(&self, v: usize, exclude: usize) -> Option<usize> {
        match self.boundary_neighbors.get(&v)?.as_slice() {
            [a, b] if *a == exclude => Some(*b),
            [a, b] if *b == exclude => Some(*a),
            _ => None,
        }
    }
}

/// Weights of the one-ring of an extraordinary vertex of valence `k`,
/// starting at the opposite endpoint of the edge
fn extraordinary_weights(k: usize) -> Option<Vec<f64>> {
    match k {
        0..=2 => None,
        3 => Some(vec![5.0 / 12.0, -1.0 / 12.0, -1.0 / 12.0]),
        4 => Some(vec![3.0 / 8.0, 0.0, -1.0 / 8.0, 0.0]),
        _ => Some(
            (0..k)
                .map(|j| {
                    let t = 2.0 * PI * j as f64 / k as f64;
                    (0.25 + t.cos() + 0.5 * (2.0 * t).cos()) / k as f64
                })
                .collect(),
        ),
    }
}

fn extraordinary_point(center: usize, ring: &[usize], positions: &[Point3d]) -> Option<Point3d> {
    let weights = extraordinary_weights(ring.len())?;
    let sum = ring
        .iter()
        .zip(weights)
        .fold(positions[center].coords * 0.75, |acc, (&v, w)| acc + positions[v].coords * w);
    Some(Point3d::from(sum))
}

fn regular_point(v1: usize, v2: usize, ring1: &[usize], ring2: &[usize], positions: &[Point3d]) -> Point3d {
    let k1 = ring1.len();
    let k2 = ring2.len();
    let p = |v: usize| positions[v].coords;

    let sum: Vector3d = (p(v1) + p(v2)) * 0.5
        + (p(ring1[1]) + p(ring1[k1 - 1])) * 0.125
        - (p(ring1[2]) + p(ring1[k1 - 2]) + p(ring2[2]) + p(ring2[k2 - 2])) * 0.0625;
    Point3d::from(sum)
}

fn midpoint(v1: usize, v2: usize, positions: &[Point3d]) -> Point3d {
    nalgebra::center(&positions[v1], &positions[v2])
}

/// New vertex inserted on edge `(v1, v2)`
fn edge_point(v1: usize, v2: usize, topology: &Topology, positions: &[Point3d]) -> Point3d {
    if topology.edge_faces.get(&edge_key(v1, v2)) == Some(&1) {
        let outer1 = topology.other_boundary_neighbor(v1, v2);
        let outer2 = topology.other_boundary_neighbor(v2, v1);
        return match (outer1, outer2) {
            (Some(a), Some(b)) => Point3d::from(
                (positions[v1].coords + positions[v2].coords) * (9.0 / 16.0)
                    - (positions[a].coords + positions[b].coords) * (1.0 / 16.0),
            ),
            _ => midpoint(v1, v2, positions),
        };
    }

    let ring1 = topology.closed_ring(v1, v2);
    let ring2 = topology.closed_ring(v2, v1);

    let point = match (ring1, ring2) {
        (Some(r1), Some(r2)) if r1.len() == 6 && r2.len() == 6 => {
            Some(regular_point(v1, v2, &r1, &r2, positions))
        }
        (Some(r1), Some(r2)) if r1.len() == 6 => extraordinary_point(v2, &r2, positions),
        (Some(r1), Some(r2)) if r2.len() == 6 => extraordinary_point(v1, &r1, positions),
        (Some(r1), Some(r2)) => {
            match (extraordinary_point(v1, &r1, positions), extraordinary_point(v2, &r2, positions)) {
                (Some(a), Some(b)) => Some(nalgebra::center(&a, &b)),
                (a, b) => a.or(b),
            }
        }
        (Some(r1), None) => extraordinary_point(v1, &r1, positions),
        (None, Some(r2)) => extraordinary_point(v2, &r2, positions),
        (None, None) => None,
    };

    point.unwrap_or_else(|| midpoint(v1, v2, positions))
}

/// One subdivision pass
fn subdivide_once(mesh: &TriangleMesh) -> TriangleMesh {
    let topology = Topology::build(mesh);
    let positions: Vec<Point3d> = mesh.vertices.iter().map(to_f64).collect();

    // Edges in first-seen order so output numbering is deterministic.
    let mut edge_index: HashMap<(usize, usize), usize> = HashMap::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for face in &mesh.faces {
        for i in 0..3 {
            let key = edge_key(face[i], face[(i + 1) % 3]);
            edge_index.entry(key).or_insert_with(|| {
                edges.push(key);
                edges.len() - 1
            });
        }
    }

    let edge_points: Vec<Point3f> = edges
        .par_iter()
        .map(|&(a, b)| {
            let p = edge_point(a, b, &topology, &positions);
            Point3f::new(p.x as f32, p.y as f32, p.z as f32)
        })
        .collect();

    let base = mesh.vertices.len();
    let mut vertices = Vec::with_capacity(base + edge_points.len());
    vertices.extend_from_slice(&mesh.vertices);
    vertices.extend(edge_points);

    let mid = |a: usize, b: usize| base + edge_index[&edge_key(a, b)];

    let mut faces = Vec::with_capacity(mesh.faces.len() * 4);
    for &[a, b, c] in &mesh.faces {
        let ab = mid(a, b);
        let bc = mid(b, c);
        let ca = mid(c, a);
        faces.push([a, ab, ca]);
        faces.push([ab, b, bc]);
        faces.push([ca, bc, c]);
        faces.push([ab, bc, ca]);
    }

    TriangleMesh::from_vertices_and_faces(vertices, faces)
}

/// Apply `passes` rounds of butterfly subdivision
pub fn butterfly_subdivide(mesh: &TriangleMesh, passes: usize) -> Result<TriangleMesh> {
    if mesh.faces.is_empty() {
        return Err(Error::InvalidData("Mesh has no faces to subdivide".to_string()));
    }

    let vertex_count = mesh.vertex_count();
    if let Some(face) = mesh.faces.iter().find(|f| f.iter().any(|&v| v >= vertex_count)) {
        return Err(Error::InvalidData(format!(
            "Face {:?} references a vertex outside 0..{}",
            face, vertex_count
        )));
    }

    let mut current = TriangleMesh::from_vertices_and_faces(mesh.vertices.clone(), mesh.faces.clone());
    for pass in 0..passes {
        current = subdivide_once(&current);
        log::debug!(
            "Butterfly pass {}: {} vertices, {} faces",
            pass + 1,
            current.vertex_count(),
            current.face_count()
        );
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markupmodel_core::Drawable;

    fn octahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(-1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, -1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
                Point3f::new(0.0, 0.0, -1.0),
            ],
            vec![
                [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
                [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
            ],
        )
    }

    #[test]
    fn test_weights_sum_to_quarter() {
        for k in 3..12 {
            let sum: f64 = extraordinary_weights(k).unwrap().iter().sum();
            assert_relative_eq!(sum, 0.25, epsilon = 1e-12);
        }
        assert!(extraordinary_weights(2).is_none());
    }

    #[test]
    fn test_face_count_quadruples_per_pass() {
        let mesh = octahedron();
        for passes in 0..4 {
            let result = butterfly_subdivide(&mesh, passes).unwrap();
            assert_eq!(result.face_count(), 8 * 4usize.pow(passes as u32));
        }
    }

    #[test]
    fn test_closed_mesh_stays_closed() {
        let result = butterfly_subdivide(&octahedron(), 3).unwrap();
        assert!(result.is_closed_manifold());
        assert_eq!(result.euler_characteristic(), 2);
        assert!(result.signed_volume() > 0.0);
    }

    #[test]
    fn test_original_vertices_are_interpolated() {
        let mesh = octahedron();
        let result = butterfly_subdivide(&mesh, 2).unwrap();
        assert_eq!(&result.vertices[..6], &mesh.vertices[..]);
    }

    #[test]
    fn test_octahedron_rounds_out() {
        // Valence-4 stencils push edge points outward toward the sphere.
        let result = butterfly_subdivide(&octahedron(), 1).unwrap();
        let edge_point = result.vertices[6];
        let radius = edge_point.coords.norm();
        assert!(radius > std::f32::consts::FRAC_1_SQRT_2);
        assert!(radius <= 1.0);
    }

    #[test]
    fn test_planar_boundary_stays_planar() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let result = butterfly_subdivide(&mesh, 2).unwrap();
        assert_eq!(result.face_count(), 32);
        let (min, max) = result.bounding_box();
        assert_relative_eq!(min.z, 0.0);
        assert_relative_eq!(max.z, 0.0);
    }

    #[test]
    fn test_regular_stencil_on_flat_grid() {
        // Interior edge of a regular triangulated grid: stencil reproduces the midpoint.
        let mut vertices = Vec::new();
        for j in 0..5 {
            for i in 0..5 {
                vertices.push(Point3f::new(i as f32, j as f32, 0.0));
            }
        }
        let at = |i: usize, j: usize| j * 5 + i;
        let mut faces = Vec::new();
        for j in 0..4 {
            for i in 0..4 {
                faces.push([at(i, j), at(i + 1, j), at(i + 1, j + 1)]);
                faces.push([at(i, j), at(i + 1, j + 1), at(i, j + 1)]);
            }
        }
        let mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        let topology = Topology::build(&mesh);
        let positions: Vec<Point3d> = mesh.vertices.iter().map(to_f64).collect();

        let v1 = at(2, 2);
        let v2 = at(3, 2);
        assert_eq!(topology.closed_ring(v1, v2).unwrap().len(), 6);
        assert_eq!(topology.closed_ring(v2, v1).unwrap().len(), 6);

        let p = edge_point(v1, v2, &topology, &positions);
        assert_relative_eq!(p, Point3d::new(2.5, 2.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        let result = butterfly_subdivide(&TriangleMesh::new(), 3);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }
}
