//! # markupmodel Scene
//!
//! A small node registry standing in for a host application's scene graph.
//!
//! Nodes are added through the [`NodeRegistry`] capability, which hands
//! ownership to the registry and returns the identity the registry assigned.
//! [`Scene`] is the in-memory implementation, with insertion-ordered storage
//! and observer callbacks for node and batch events.

pub mod node;
pub mod registry;
pub mod scene;

pub use node::*;
pub use registry::*;
pub use scene::*;
