//! Node registry capability

use crate::node::*;
use markupmodel_core::{Error, Result};

/// The operations a scene must offer to consumers that create nodes
///
/// Adding a node transfers ownership to the registry; afterwards the node is
/// reached only through the returned identity.
pub trait NodeRegistry {
    /// Take ownership of `node` and return its new identity
    fn add_node(&mut self, node: Node) -> NodeId;

    fn node(&self, id: &NodeId) -> Option<&Node>;

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node>;

    /// Remove a node and drop every reference other nodes hold to it
    fn remove_node(&mut self, id: &NodeId) -> Option<Node>;

    /// Point a model node at its display node
    fn set_display_node(&mut self, model: &NodeId, display: &NodeId) -> Result<()> {
        match self.node(display) {
            Some(Node::ModelDisplay(_)) => {}
            Some(other) => {
                return Err(Error::Registry(format!(
                    "{} is a {}, not a display node",
                    display,
                    other.class().class_name()
                )))
            }
            None => return Err(Error::Registry(format!("Unknown display node {}", display))),
        }

        let model_node = self
            .node_mut(model)
            .ok_or_else(|| Error::Registry(format!("Unknown model node {}", model)))?
            .as_model_mut()
            .ok_or_else(|| Error::Registry(format!("{} is not a model node", model)))?;
        model_node.display_node_id = Some(display.clone());
        Ok(())
    }
}
