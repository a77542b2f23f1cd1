//! # markupmodel Reconstruction
//!
//! Closed surface reconstruction from sparse 3D point sets.
//!
//! The crate provides the three geometric stages of the markups-to-model
//! workflow (Delaunay tetrahedralization, boundary surface extraction and
//! butterfly subdivision) plus the [`SurfaceReconstructor`] that chains them.

pub mod delaunay;
pub mod surface;
pub mod subdivision;
pub mod pipeline;

// Re-export commonly used items
pub use delaunay::*;
pub use surface::*;
pub use subdivision::*;
pub use pipeline::*;
