//! I/O operations for fiducial lists and meshes
//! 
//! This crate reads markups fiducial lists (Slicer `.fcsv` and plain XYZ/CSV)
//! and writes reconstructed surfaces as OBJ or PLY.

pub mod fcsv;
pub mod xyz_csv;
pub mod ply;
pub mod obj;

pub use fcsv::{FcsvReader, FcsvWriter, CoordinateSystem};
pub use xyz_csv::{XyzCsvReader, XyzCsvSchema, Delimiter, ColumnType};
pub use ply::PlyMeshFormat;
pub use obj::ObjMeshFormat;

use markupmodel_core::{Error, Fiducial, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading fiducial lists from files
pub trait FiducialReader {
    fn read_fiducials<P: AsRef<Path>>(path: P) -> Result<Vec<Fiducial>>;
}

/// Trait for writing fiducial lists to files
pub trait FiducialWriter {
    fn write_fiducials<P: AsRef<Path>>(fiducials: &[Fiducial], path: P) -> Result<()>;
}

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format and read a fiducial list
pub fn read_fiducials<P: AsRef<Path>>(path: P) -> Result<Vec<Fiducial>> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("fcsv") => FcsvReader::read_fiducials(path),
        Some("csv") | Some("xyz") | Some("txt") => XyzCsvReader::read_fiducials(path),
        _ => Err(Error::UnsupportedFormat(
            format!("Unsupported fiducial format: {:?}", path.extension())
        )),
    }
}

/// Write a fiducial list; only `.fcsv` is supported
pub fn write_fiducials<P: AsRef<Path>>(fiducials: &[Fiducial], path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("fcsv") => FcsvWriter::write_fiducials(fiducials, path),
        _ => Err(Error::UnsupportedFormat(
            format!("Unsupported fiducial format: {:?}", path.extension())
        )),
    }
}

/// Auto-detect format and write a mesh
pub fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => ObjMeshFormat::write_mesh(mesh, path),
        Some("ply") => PlyMeshFormat::write_mesh(mesh, path),
        _ => Err(Error::UnsupportedFormat(
            format!("Unsupported mesh format: {:?}", path.extension())
        )),
    }
}

/// Auto-detect format and read a mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("obj") => ObjMeshFormat::read_mesh(path),
        Some("ply") => PlyMeshFormat::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(
            format!("Unsupported mesh format: {:?}", path.extension())
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markupmodel_core::Point3f;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("markupmodel_io_{}_{}", std::process::id(), name))
    }

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_unknown_extensions_are_rejected() {
        let path = temp_path("mesh.stl");
        assert!(matches!(write_mesh(&triangle(), &path), Err(Error::UnsupportedFormat(_))));
        assert!(matches!(read_fiducials(temp_path("points.json")), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_write_mesh_dispatches_on_extension() {
        for name in ["dispatch.obj", "dispatch.PLY"] {
            let path = temp_path(name);
            write_mesh(&triangle(), &path).unwrap();
            let loaded = read_mesh(&path).unwrap();
            assert_eq!(loaded.face_count(), 1);
            assert_eq!(loaded.vertex_count(), 3);
            let _ = fs::remove_file(&path);
        }
    }

    #[test]
    fn test_read_fiducials_dispatches_on_extension() {
        let path = temp_path("points.xyz");
        fs::write(&path, "0 0 0\n1 0 0\n0 1 0\n").unwrap();
        let fiducials = read_fiducials(&path).unwrap();
        assert_eq!(fiducials.len(), 3);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_fcsv_file_dispatch() {
        let path = temp_path("list.fcsv");
        let fiducials = vec![Fiducial::new("F-1", Point3f::new(1.0, 2.0, 3.0))];
        write_fiducials(&fiducials, &path).unwrap();
        assert_eq!(read_fiducials(&path).unwrap(), fiducials);
        let _ = fs::remove_file(&path);

        assert!(write_fiducials(&fiducials, temp_path("list.csv")).is_err());
    }
}
