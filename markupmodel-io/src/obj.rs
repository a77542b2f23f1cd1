//! Wavefront OBJ mesh support
//!
//! Only `v`, `vn` and `f` records are handled. Face corners may use the
//! `v/vt/vn` forms and negative (relative) indices.

use crate::{MeshReader, MeshWriter};
use markupmodel_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub struct ObjMeshFormat;

impl ObjMeshFormat {
    pub fn parse<R: BufRead>(reader: R) -> Result<TriangleMesh> {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut faces = Vec::new();

        for (line_index, line) in reader.lines().enumerate() {
            let line = line?;
            let mut parts = line.split_whitespace();
            let line_number = line_index + 1;

            match parts.next() {
                Some("v") => {
                    let [x, y, z] = parse_floats(&mut parts, line_number)?;
                    vertices.push(Point3f::new(x, y, z));
                }
                Some("vn") => {
                    let [x, y, z] = parse_floats(&mut parts, line_number)?;
                    normals.push(Vector3f::new(x, y, z));
                }
                Some("f") => {
                    let corners = parts
                        .map(|corner| resolve_index(corner, vertices.len(), line_number))
                        .collect::<Result<Vec<usize>>>()?;
                    if corners.len() < 3 {
                        return Err(Error::InvalidData(format!(
                            "Line {}: face needs at least three corners",
                            line_number
                        )));
                    }
                    for k in 1..corners.len() - 1 {
                        faces.push([corners[0], corners[k], corners[k + 1]]);
                    }
                }
                _ => {}
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        if !normals.is_empty() && normals.len() == mesh.vertex_count() {
            mesh.set_normals(normals);
        }
        Ok(mesh)
    }

    pub fn write<W: Write>(mesh: &TriangleMesh, mut writer: W) -> Result<()> {
        writeln!(writer, "# {} vertices, {} faces", mesh.vertex_count(), mesh.face_count())?;
        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }

        let normals = mesh.normals.as_ref().filter(|n| n.len() == mesh.vertex_count());
        if let Some(normals) = normals {
            for n in normals {
                writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        // OBJ indices are 1-based
        for face in &mesh.faces {
            let [a, b, c] = face.map(|i| i + 1);
            if normals.is_some() {
                writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
            } else {
                writeln!(writer, "f {a} {b} {c}")?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

fn parse_floats<'a, I>(parts: &mut I, line_number: usize) -> Result<[f32; 3]>
where
    I: Iterator<Item = &'a str>,
{
    let mut values = [0.0f32; 3];
    for value in &mut values {
        let text = parts.next().ok_or_else(|| {
            Error::InvalidData(format!("Line {}: expected three coordinates", line_number))
        })?;
        *value = text.parse().map_err(|_| {
            Error::InvalidData(format!("Line {}: invalid number '{}'", line_number, text))
        })?;
    }
    Ok(values)
}

fn resolve_index(corner: &str, vertex_count: usize, line_number: usize) -> Result<usize> {
    let text = corner.split('/').next().unwrap_or(corner);
    let raw: i64 = text.parse().map_err(|_| {
        Error::InvalidData(format!("Line {}: invalid face index '{}'", line_number, corner))
    })?;

    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r - 1),
        r => Some(vertex_count as i64 + r),
    };
    resolved
        .filter(|&i| i >= 0 && (i as usize) < vertex_count)
        .map(|i| i as usize)
        .ok_or_else(|| {
            Error::InvalidData(format!("Line {}: face index {} out of range", line_number, raw))
        })
}

impl MeshReader for ObjMeshFormat {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

impl MeshWriter for ObjMeshFormat {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path.as_ref())?;
        Self::write(mesh, BufWriter::new(file))?;
        log::debug!(
            "Wrote {} vertices and {} faces to {}",
            mesh.vertex_count(),
            mesh.face_count(),
            path.as_ref().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn tetrahedron() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
                Point3f::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
    }

    #[test]
    fn test_write_uses_one_based_indices() {
        let mut buffer = Vec::new();
        ObjMeshFormat::write(&tetrahedron(), &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("f 1 3 2"));
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 4);
    }

    #[test]
    fn test_written_mesh_keeps_topology() {
        let mut mesh = tetrahedron();
        mesh.compute_vertex_normals();
        let mut buffer = Vec::new();
        ObjMeshFormat::write(&mesh, &mut buffer).unwrap();

        let loaded = ObjMeshFormat::parse(Cursor::new(buffer)).unwrap();
        assert_eq!(loaded.faces, mesh.faces);
        assert!(loaded.is_closed_manifold());
        assert_eq!(loaded.normals.map(|n| n.len()), Some(4));
    }

    #[test]
    fn test_relative_indices_and_slashes() {
        let text = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf -4/1/1 -3/2/1 -2/3/1 -1/4/1\n";
        let mesh = ObjMeshFormat::parse(Cursor::new(text)).unwrap();
        assert_eq!(mesh.faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_bad_index_is_rejected() {
        let text = "v 0 0 0\nf 1 2 3\n";
        assert!(matches!(ObjMeshFormat::parse(Cursor::new(text)), Err(Error::InvalidData(_))));
        assert!(ObjMeshFormat::parse(Cursor::new("v 0 zero 0\n")).is_err());
    }
}
