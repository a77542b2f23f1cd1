//! Point set to smoothed surface pipeline
//!
//! The stages run strictly in order, each consuming only the previous stage's
//! output:
//!
//! 1. point assembly into an index-preserving point cloud
//! 2. a single poly-line through every point, the volume stage's input shape
//! 3. Delaunay tetrahedralization
//! 4. boundary surface extraction
//! 5. [`SUBDIVISION_PASSES`] rounds of butterfly subdivision
//!
//! Failures from any geometric stage are returned unchanged.

use crate::delaunay::{delaunay_3d_with_config, Delaunay3DConfig};
use crate::subdivision::butterfly_subdivide;
use crate::surface::extract_surface;
use markupmodel_core::{Error, LinedPointSet, Point3f, PointCloud, PolyLine, Result, TriangleMesh};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Butterfly passes applied to every reconstructed surface
pub const SUBDIVISION_PASSES: usize = 3;

/// Point count below which a reconstruction is considered suspect
pub const DEFAULT_MIN_POINT_COUNT: usize = 10;

/// Name given to the output model unless configured otherwise
pub const DEFAULT_MODEL_NAME: &str = "CylinderModel";

/// Configuration for surface reconstruction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// Fewer points than this logs a warning; the run still proceeds
    pub min_point_count: usize,
    /// Name of the registered model; the display is named `<model_name>Display`
    pub model_name: String,
    /// Volume stage parameters
    pub delaunay: Delaunay3DConfig,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            min_point_count: DEFAULT_MIN_POINT_COUNT,
            model_name: DEFAULT_MODEL_NAME.to_string(),
            delaunay: Delaunay3DConfig::default(),
        }
    }
}

impl ReconstructionConfig {
    /// Set the warning threshold
    pub fn with_min_point_count(mut self, min_point_count: usize) -> Self {
        self.min_point_count = min_point_count;
        self
    }

    /// Set the output model name
    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = model_name.into();
        self
    }

    /// Set the volume stage parameters
    pub fn with_delaunay(mut self, delaunay: Delaunay3DConfig) -> Self {
        self.delaunay = delaunay;
        self
    }

    /// Name of the display paired with the output model
    pub fn display_name(&self) -> String {
        format!("{}Display", self.model_name)
    }
}

/// Non-fatal conditions noticed during a reconstruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconstructionWarning {
    /// Fewer input points than the configured minimum
    InsufficientPoints { count: usize, minimum: usize },
}

impl fmt::Display for ReconstructionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconstructionWarning::InsufficientPoints { count, minimum } => {
                write!(f, "Not enough fiducials: {} given, {} expected", count, minimum)
            }
        }
    }
}

/// Sizes observed at each stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub input_points: usize,
    pub polyline_length: usize,
    pub tetrahedra: usize,
    pub boundary_faces: usize,
    pub subdivision_passes: usize,
}

/// Output of a reconstruction run
#[derive(Debug, Clone)]
pub struct ReconstructedSurface {
    /// The smoothed closed surface
    pub mesh: TriangleMesh,
    pub report: StageReport,
    pub warnings: Vec<ReconstructionWarning>,
}

/// Stage 1: one cloud entry per input point, same order
pub fn assemble_points(points: &[Point3f]) -> PointCloud<Point3f> {
    PointCloud::from_points(points.to_vec())
}

/// Stage 2: a single poly-line through all points in input order
pub fn closed_curve_topology(point_count: usize) -> PolyLine {
    PolyLine::through(point_count)
}

/// Runs the reconstruction stages for a point set
#[derive(Debug, Clone, Default)]
pub struct SurfaceReconstructor {
    config: ReconstructionConfig,
}

impl SurfaceReconstructor {
    pub fn new(config: ReconstructionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct a smoothed surface enclosing `points`
    pub fn reconstruct(&self, points: &[Point3f]) -> Result<ReconstructedSurface> {
        if points.is_empty() {
            return Err(Error::InvalidData("No points to reconstruct a surface from".to_string()));
        }

        let mut warnings = Vec::new();
        if points.len() < self.config.min_point_count {
            let warning = ReconstructionWarning::InsufficientPoints {
                count: points.len(),
                minimum: self.config.min_point_count,
            };
            log::warn!("{}", warning);
            warnings.push(warning);
        }

        let cloud = assemble_points(points);
        let curve = closed_curve_topology(cloud.len());
        let polyline_length = curve.len();
        let input = LinedPointSet::new(cloud, vec![curve]);

        let volume = delaunay_3d_with_config(&input, &self.config.delaunay)?;
        let boundary = extract_surface(&volume)?;
        let mesh = butterfly_subdivide(&boundary, SUBDIVISION_PASSES)?;

        let report = StageReport {
            input_points: points.len(),
            polyline_length,
            tetrahedra: volume.tetra_count(),
            boundary_faces: boundary.face_count(),
            subdivision_passes: SUBDIVISION_PASSES,
        };

        log::info!(
            "Reconstructed surface from {} points: {} vertices, {} faces",
            report.input_points,
            mesh.vertex_count(),
            mesh.face_count()
        );

        Ok(ReconstructedSurface { mesh, report, warnings })
    }
}

/// Reconstruct a surface mesh with the default configuration
pub fn reconstruct_surface_mesh(points: &[Point3f]) -> Result<TriangleMesh> {
    SurfaceReconstructor::default().reconstruct(points).map(|surface| surface.mesh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octahedron_points() -> Vec<Point3f> {
        vec![
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(-1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
            Point3f::new(0.0, -1.0, 0.0),
            Point3f::new(0.0, 0.0, 1.0),
            Point3f::new(0.0, 0.0, -1.0),
        ]
    }

    #[test]
    fn test_config_default() {
        let config = ReconstructionConfig::default();
        assert_eq!(config.min_point_count, 10);
        assert_eq!(config.model_name, "CylinderModel");
        assert_eq!(config.display_name(), "CylinderModelDisplay");
    }

    #[test]
    fn test_config_builders() {
        let config = ReconstructionConfig::default()
            .with_model_name("SkullSurface")
            .with_min_point_count(4);
        assert_eq!(config.display_name(), "SkullSurfaceDisplay");
        assert_eq!(config.min_point_count, 4);
    }

    #[test]
    fn test_curve_topology_in_order() {
        let curve = closed_curve_topology(7);
        assert_eq!(curve.point_ids, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_assemble_points_keeps_indices() {
        let points = octahedron_points();
        let cloud = assemble_points(&points);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(&cloud[i], p);
        }
    }

    #[test]
    fn test_few_points_warn_but_succeed() {
        let surface = SurfaceReconstructor::default().reconstruct(&octahedron_points()).unwrap();
        assert_eq!(
            surface.warnings,
            vec![ReconstructionWarning::InsufficientPoints { count: 6, minimum: 10 }]
        );
        assert_eq!(surface.report.boundary_faces, 8);
        assert_eq!(surface.mesh.face_count(), 8 * 64);
    }

    #[test]
    fn test_empty_input_is_error() {
        let result = SurfaceReconstructor::default().reconstruct(&[]);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_degenerate_input_propagates() {
        let points = vec![Point3f::new(0.0, 0.0, 0.0); 3];
        let result = reconstruct_surface_mesh(&points);
        assert!(matches!(result, Err(Error::Degenerate(_))));
    }
}
