//! Scene node types

use markupmodel_core::{Fiducial, Point3f, TriangleMesh};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity assigned to a node when it joins a scene
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a node, used to build identities and filter lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeClass {
    Model,
    ModelDisplay,
    MarkupsFiducial,
    MarkupsToModel,
}

impl NodeClass {
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeClass::Model => "ModelNode",
            NodeClass::ModelDisplay => "ModelDisplayNode",
            NodeClass::MarkupsFiducial => "MarkupsFiducialNode",
            NodeClass::MarkupsToModel => "MarkupsToModelNode",
        }
    }
}

/// A surface model: geometry plus a reference to its display node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelNode {
    pub name: String,
    pub mesh: Option<TriangleMesh>,
    pub display_node_id: Option<NodeId>,
}

impl ModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attach geometry
    pub fn with_mesh(mut self, mesh: TriangleMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }
}

/// Visual styling of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDisplayNode {
    pub name: String,
    pub color: [f32; 3],
    pub opacity: f32,
    pub visible: bool,
}

impl ModelDisplayNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: [0.5, 0.5, 0.5],
            opacity: 1.0,
            visible: true,
        }
    }
}

impl Default for ModelDisplayNode {
    fn default() -> Self {
        Self::new("")
    }
}

/// An ordered list of fiducial markers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupsFiducialNode {
    pub name: String,
    pub fiducials: Vec<Fiducial>,
}

impl MarkupsFiducialNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fiducials: Vec::new(),
        }
    }

    pub fn from_fiducials(name: impl Into<String>, fiducials: Vec<Fiducial>) -> Self {
        Self {
            name: name.into(),
            fiducials,
        }
    }

    /// Append a fiducial labelled `<name>-<n>` and return its index
    pub fn add_fiducial(&mut self, position: Point3f) -> usize {
        let label = format!("{}-{}", self.name, self.fiducials.len() + 1);
        self.fiducials.push(Fiducial::new(label, position));
        self.fiducials.len() - 1
    }

    pub fn number_of_fiducials(&self) -> usize {
        self.fiducials.len()
    }

    pub fn nth_fiducial_position(&self, n: usize) -> Option<Point3f> {
        self.fiducials.get(n).map(|f| f.position)
    }

    /// All positions in list order
    pub fn positions(&self) -> Vec<Point3f> {
        self.fiducials.iter().map(|f| f.position).collect()
    }
}

/// Parameters of the markups-to-model module
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupsToModelNode {
    pub name: String,
    markups_node_id: Option<NodeId>,
}

impl MarkupsToModelNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            markups_node_id: None,
        }
    }

    /// The observed markups node, if any
    pub fn markups_node_id(&self) -> Option<&NodeId> {
        self.markups_node_id.as_ref()
    }

    /// Replace the observed markups node
    pub fn set_and_observe_markups_node_id(&mut self, id: Option<NodeId>) {
        self.markups_node_id = id;
    }
}

/// Any node a scene can hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Model(ModelNode),
    ModelDisplay(ModelDisplayNode),
    MarkupsFiducial(MarkupsFiducialNode),
    MarkupsToModel(MarkupsToModelNode),
}

impl Node {
    pub fn class(&self) -> NodeClass {
        match self {
            Node::Model(_) => NodeClass::Model,
            Node::ModelDisplay(_) => NodeClass::ModelDisplay,
            Node::MarkupsFiducial(_) => NodeClass::MarkupsFiducial,
            Node::MarkupsToModel(_) => NodeClass::MarkupsToModel,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Model(n) => &n.name,
            Node::ModelDisplay(n) => &n.name,
            Node::MarkupsFiducial(n) => &n.name,
            Node::MarkupsToModel(n) => &n.name,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match self {
            Node::Model(n) => n.name = name,
            Node::ModelDisplay(n) => n.name = name,
            Node::MarkupsFiducial(n) => n.name = name,
            Node::MarkupsToModel(n) => n.name = name,
        }
    }

    pub fn as_model(&self) -> Option<&ModelNode> {
        match self {
            Node::Model(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_model_mut(&mut self) -> Option<&mut ModelNode> {
        match self {
            Node::Model(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_model_display(&self) -> Option<&ModelDisplayNode> {
        match self {
            Node::ModelDisplay(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_markups(&self) -> Option<&MarkupsFiducialNode> {
        match self {
            Node::MarkupsFiducial(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_markups_mut(&mut self) -> Option<&mut MarkupsFiducialNode> {
        match self {
            Node::MarkupsFiducial(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_markups_to_model(&self) -> Option<&MarkupsToModelNode> {
        match self {
            Node::MarkupsToModel(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_markups_to_model_mut(&mut self) -> Option<&mut MarkupsToModelNode> {
        match self {
            Node::MarkupsToModel(n) => Some(n),
            _ => None,
        }
    }
}

impl From<ModelNode> for Node {
    fn from(node: ModelNode) -> Self {
        Node::Model(node)
    }
}

impl From<ModelDisplayNode> for Node {
    fn from(node: ModelDisplayNode) -> Self {
        Node::ModelDisplay(node)
    }
}

impl From<MarkupsFiducialNode> for Node {
    fn from(node: MarkupsFiducialNode) -> Self {
        Node::MarkupsFiducial(node)
    }
}

impl From<MarkupsToModelNode> for Node {
    fn from(node: MarkupsToModelNode) -> Self {
        Node::MarkupsToModel(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markups_positions() {
        let mut markups = MarkupsFiducialNode::new("F");
        markups.add_fiducial(Point3f::new(1.0, 2.0, 3.0));
        markups.add_fiducial(Point3f::new(4.0, 5.0, 6.0));

        assert_eq!(markups.number_of_fiducials(), 2);
        assert_eq!(markups.fiducials[1].label, "F-2");
        assert_eq!(markups.nth_fiducial_position(0), Some(Point3f::new(1.0, 2.0, 3.0)));
        assert_eq!(markups.nth_fiducial_position(2), None);
    }

    #[test]
    fn test_node_accessors() {
        let mut node = Node::from(ModelNode::new("Surface"));
        assert_eq!(node.class(), NodeClass::Model);
        assert!(node.as_model().is_some());
        assert!(node.as_markups().is_none());

        node.set_name("Renamed");
        assert_eq!(node.name(), "Renamed");
    }

    #[test]
    fn test_display_defaults() {
        let display = ModelDisplayNode::new("SurfaceDisplay");
        assert_eq!(display.color, [0.5, 0.5, 0.5]);
        assert_eq!(display.opacity, 1.0);
        assert!(display.visible);
    }
}
