//! # markupmodel
//!
//! Turn a set of fiducial markers into a smoothed, closed surface model.
//!
//! This is the umbrella crate that provides convenient access to all markupmodel
//! functionality. You can use this crate to get everything in one place, or use
//! individual crates for more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Points, fiducials, point sets with cells, tetrahedral and triangle meshes
//! - **Reconstruction**: Delaunay 3D, surface extraction and butterfly subdivision
//! - **Scene**: Node registry with identities and change events
//! - **Logic**: The markups-to-model module wiring reconstruction into a scene
//! - **I/O**: Fiducial lists (FCSV, XYZ/CSV) and meshes (PLY, OBJ)
//! - **Calibration**: Timed pivot/spin pose acquisition and pivot solving
//!
//! ## Quick Start
//!
//! ```rust
//! use markupmodel::prelude::*;
//!
//! let points = vec![
//!     Point3f::new(0.0, 0.0, 0.0),
//!     Point3f::new(1.0, 0.0, 0.0),
//!     Point3f::new(0.0, 1.0, 0.0),
//!     Point3f::new(0.0, 0.0, 1.0),
//! ];
//!
//! let mut scene = Scene::new();
//! let output = MarkupsToModelLogic::default()
//!     .reconstruct_surface(&points, &mut scene)
//!     .unwrap();
//! assert_eq!(scene.len(), 2);
//! assert!(!output.warnings.is_empty());
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables reconstruction, scene, logic and io
//! - `reconstruction`: Geometry pipeline
//! - `scene`: Node registry
//! - `logic`: Markups-to-model module (pulls in reconstruction and scene)
//! - `io`: File format support
//! - `calibration`: Pivot calibration sequencing
//! - `all`: Enables all features

// Re-export core functionality
pub use markupmodel_core::*;

// Re-export sub-crates
#[cfg(feature = "reconstruction")]
pub use markupmodel_reconstruction as reconstruction;

#[cfg(feature = "scene")]
pub use markupmodel_scene as scene;

#[cfg(feature = "logic")]
pub use markupmodel_logic as logic;

#[cfg(feature = "io")]
pub use markupmodel_io as io;

#[cfg(feature = "calibration")]
pub use markupmodel_calibration as calibration;

/// Convenient imports for common use cases
pub mod prelude {
    pub use markupmodel_core::{
        Drawable, Error, Fiducial, LinedPointSet, Point3f, PointCloud, PolyLine, Result,
        TetrahedralMesh, TriangleMesh,
    };

    #[cfg(feature = "reconstruction")]
    pub use markupmodel_reconstruction::{
        butterfly_subdivide, delaunay_3d, extract_surface, Delaunay3DConfig,
        ReconstructionConfig, SurfaceReconstructor,
    };

    #[cfg(feature = "scene")]
    pub use markupmodel_scene::{
        MarkupsFiducialNode, MarkupsToModelNode, ModelDisplayNode, ModelNode, Node, NodeId,
        NodeRegistry, Scene, SceneEvent,
    };

    #[cfg(feature = "logic")]
    pub use markupmodel_logic::{LinkOutcome, MarkupsToModelLogic, OutputModel};

    #[cfg(feature = "io")]
    pub use markupmodel_io::{read_fiducials, read_mesh, write_fiducials, write_mesh};

    #[cfg(feature = "calibration")]
    pub use markupmodel_calibration::{
        compute_pivot_calibration, CalibrationPhase, CalibrationSequencer, Scheduler,
        SequencerConfig,
    };
}
