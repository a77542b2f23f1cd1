//! PLY mesh support

use crate::{MeshReader, MeshWriter};
use markupmodel_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use ply_rs::{
    parser::Parser,
    ply::{Addable, DefaultElement, ElementDef, Ply, Property, PropertyDef, PropertyType, ScalarType},
    writer::Writer,
};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// ASCII PLY reader and writer for triangle meshes
pub struct PlyMeshFormat;

impl PlyMeshFormat {
    /// Parse a mesh; polygons with more than three corners are fan-triangulated
    pub fn parse<R: BufRead>(mut reader: R) -> Result<TriangleMesh> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let mut vertices = Vec::new();
        if let Some(vertex_element) = ply.payload.get("vertex") {
            for vertex in vertex_element {
                vertices.push(Point3f::new(
                    extract_property_value(vertex, "x")?,
                    extract_property_value(vertex, "y")?,
                    extract_property_value(vertex, "z")?,
                ));
            }
        }

        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face, vertices.len())?;
                for k in 1..indices.len().saturating_sub(1) {
                    faces.push([indices[0], indices[k], indices[k + 1]]);
                }
            }
        }

        let normals: Option<Vec<Vector3f>> = ply.payload.get("vertex").and_then(|element| {
            element
                .iter()
                .map(|v| {
                    Some(Vector3f::new(
                        extract_property_value(v, "nx").ok()?,
                        extract_property_value(v, "ny").ok()?,
                        extract_property_value(v, "nz").ok()?,
                    ))
                })
                .collect::<Option<Vec<_>>>()
                .filter(|normals| !normals.is_empty())
        });

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        if let Some(normals) = normals {
            mesh.set_normals(normals);
        }
        Ok(mesh)
    }

    /// Serialize a mesh; normals are written when present
    pub fn write<W: Write>(mesh: &TriangleMesh, mut writer: W) -> Result<()> {
        let mut ply = Ply::<DefaultElement>::new();
        let float = || PropertyType::Scalar(ScalarType::Float);

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        let mut vertex_properties = vec!["x", "y", "z"];
        if mesh.normals.is_some() {
            vertex_properties.extend(["nx", "ny", "nz"]);
        }
        for name in &vertex_properties {
            vertex_element.properties.add(PropertyDef::new(name.to_string(), float()));
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let vertices = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, vertex)| {
                let mut element = DefaultElement::new();
                element.insert("x".to_string(), Property::Float(vertex.x));
                element.insert("y".to_string(), Property::Float(vertex.y));
                element.insert("z".to_string(), Property::Float(vertex.z));
                if let Some(normal) = mesh.normals.as_ref().and_then(|n| n.get(i)) {
                    element.insert("nx".to_string(), Property::Float(normal.x));
                    element.insert("ny".to_string(), Property::Float(normal.y));
                    element.insert("nz".to_string(), Property::Float(normal.z));
                }
                element
            })
            .collect();
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut indices = Vec::with_capacity(3);
            for &index in face {
                indices.push(i32::try_from(index).map_err(|_| {
                    Error::InvalidData(format!("Vertex index {} does not fit a PLY int", index))
                })?);
            }
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        Writer::new().write_ply(&mut writer, &mut ply)?;
        writer.flush()?;
        Ok(())
    }
}

impl MeshReader for PlyMeshFormat {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

impl MeshWriter for PlyMeshFormat {
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

fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

fn extract_face_indices(element: &DefaultElement, vertex_count: usize) -> Result<Vec<usize>> {
    let indices: Vec<i64> = match element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"))
    {
        Some(Property::ListInt(indices)) => indices.iter().map(|&i| i64::from(i)).collect(),
        Some(Property::ListUInt(indices)) => indices.iter().map(|&i| i64::from(i)).collect(),
        _ => return Err(Error::InvalidData("Face indices not found".to_string())),
    };

    indices
        .into_iter()
        .map(|index| {
            usize::try_from(index)
                .ok()
                .filter(|&i| i < vertex_count)
                .ok_or_else(|| Error::InvalidData(format!("Face index {} out of range", index)))
        })
        .collect()
}
