//! Boundary surface extraction from tetrahedral volumes

use markupmodel_core::{Error, Result, TetrahedralMesh, TriangleMesh};
use std::collections::HashMap;

/// Extract the outer skin of a tetrahedral volume
///
/// A face is on the boundary when exactly one tetrahedron uses it. Boundary
/// triangles keep the outward winding of their tetrahedron, and only the
/// vertices they reference are kept, renumbered in first-use order.
pub fn extract_surface(volume: &TetrahedralMesh) -> Result<TriangleMesh> {
    if volume.is_empty() {
        return Err(Error::Algorithm("Volume has no tetrahedra to extract a surface from".to_string()));
    }

    let vertex_count = volume.vertex_count();
    if let Some(tetra) = volume.tetrahedra.iter().find(|t| t.iter().any(|&v| v >= vertex_count)) {
        return Err(Error::InvalidData(format!(
            "Tetrahedron {:?} references a vertex outside 0..{}",
            tetra, vertex_count
        )));
    }

    let mut uses: HashMap<[usize; 3], usize> = HashMap::new();
    for tetra in &volume.tetrahedra {
        for face in TetrahedralMesh::outward_faces(tetra) {
            *uses.entry(sorted(face)).or_insert(0) += 1;
        }
    }

    let mut remap: Vec<Option<usize>> = vec![None; vertex_count];
    let mut mesh = TriangleMesh::new();

    for tetra in &volume.tetrahedra {
        for face in TetrahedralMesh::outward_faces(tetra) {
            if uses[&sorted(face)] != 1 {
                continue;
            }
            let mapped = face.map(|v| {
                *remap[v].get_or_insert_with(|| mesh.add_vertex(volume.vertices[v]))
            });
            mesh.add_face(mapped);
        }
    }

    log::debug!(
        "Surface extraction: {} tetrahedra -> {} boundary faces",
        volume.tetra_count(),
        mesh.face_count()
    );

    Ok(mesh)
}

fn sorted(mut face: [usize; 3]) -> [usize; 3] {
    face.sort_unstable();
    face
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use markupmodel_core::Point3f;

    fn two_tetra_volume() -> TetrahedralMesh {
        // Two tetrahedra glued on face (0, 1, 2).
        TetrahedralMesh::new(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
                Point3f::new(0.0, 0.0, -1.0),
                Point3f::new(9.0, 9.0, 9.0),
            ],
            vec![[0, 1, 2, 3], [0, 2, 1, 4]],
        )
    }

    #[test]
    fn test_shared_face_is_interior() {
        let mesh = extract_surface(&two_tetra_volume()).unwrap();
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.is_closed_manifold());
    }

    #[test]
    fn test_unused_vertices_are_dropped() {
        let mesh = extract_surface(&two_tetra_volume()).unwrap();
        assert_eq!(mesh.vertex_count(), 5);
        assert!(!mesh.vertices.contains(&Point3f::new(9.0, 9.0, 9.0)));
    }

    #[test]
    fn test_outward_winding() {
        let mesh = extract_surface(&two_tetra_volume()).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 3.0, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_volume() {
        let result = extract_surface(&TetrahedralMesh::default());
        assert!(matches!(result, Err(Error::Algorithm(_))));
    }

    #[test]
    fn test_out_of_range_vertex() {
        let volume = TetrahedralMesh::new(vec![Point3f::origin(); 3], vec![[0, 1, 2, 3]]);
        assert!(matches!(extract_surface(&volume), Err(Error::InvalidData(_))));
    }
}
