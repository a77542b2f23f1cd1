//! In-memory scene

use crate::node::*;
use crate::registry::NodeRegistry;
use std::collections::HashMap;

/// Notifications sent to scene observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneEvent {
    NodeAdded(NodeId),
    NodeRemoved(NodeId),
    StartBatchProcess,
    EndBatchProcess,
}

/// Handle returned by [`Scene::add_observer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

pub type SceneObserver = Box<dyn FnMut(&SceneEvent)>;

/// Insertion-ordered node storage with event notification
///
/// Identities are `<ClassName><n>` with a per-class counter that never goes
/// back, so an identity is never reused after its node is removed.
#[derive(Default)]
pub struct Scene {
    nodes: Vec<(NodeId, Node)>,
    counters: HashMap<NodeClass, usize>,
    observers: Vec<(ObserverId, SceneObserver)>,
    next_observer: usize,
    batch_depth: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node identities in insertion order
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|(id, _)| id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.position(id).is_some()
    }

    pub fn nodes_by_class(&self, class: NodeClass) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.class() == class)
            .map(|(id, _)| id)
            .collect()
    }

    pub fn nodes_by_name(&self, name: &str) -> Vec<&NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| node.name() == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Register a callback for scene events
    pub fn add_observer<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&SceneEvent) + 'static,
    {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer, _)| *observer != id);
        self.observers.len() != before
    }

    /// Enter batch processing; batches nest
    pub fn start_batch(&mut self) {
        self.batch_depth += 1;
        if self.batch_depth == 1 {
            self.notify(&SceneEvent::StartBatchProcess);
        }
    }

    /// Leave batch processing; the end event fires when the outermost batch closes
    pub fn end_batch(&mut self) {
        match self.batch_depth {
            0 => log::warn!("end_batch called without a matching start_batch"),
            1 => {
                self.batch_depth = 0;
                self.notify(&SceneEvent::EndBatchProcess);
            }
            _ => self.batch_depth -= 1,
        }
    }

    pub fn is_batch_processing(&self) -> bool {
        self.batch_depth > 0
    }

    /// Remove every node, one event per node
    pub fn clear(&mut self) {
        let ids: Vec<NodeId> = self.node_ids().cloned().collect();
        self.start_batch();
        for id in ids.iter().rev() {
            self.remove_node(id);
        }
        self.end_batch();
    }

    fn position(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|(existing, _)| existing == id)
    }

    fn next_id(&mut self, class: NodeClass) -> NodeId {
        let counter = self.counters.entry(class).or_insert(0);
        *counter += 1;
        NodeId::new(format!("{}{}", class.class_name(), counter))
    }

    fn notify(&mut self, event: &SceneEvent) {
        for (_, observer) in &mut self.observers {
            observer(event);
        }
    }
}

impl NodeRegistry for Scene {
    fn add_node(&mut self, node: Node) -> NodeId {
        let id = self.next_id(node.class());
        log::debug!("Added {} ({:?}) to scene", id, node.name());
        self.nodes.push((id.clone(), node));
        self.notify(&SceneEvent::NodeAdded(id.clone()));
        id
    }

    fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|(existing, _)| existing == id).map(|(_, node)| node)
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|(existing, _)| existing == id).map(|(_, node)| node)
    }

    fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        let index = self.position(id)?;
        let (_, node) = self.nodes.remove(index);

        for (_, other) in &mut self.nodes {
            match other {
                Node::Model(model) if model.display_node_id.as_ref() == Some(id) => {
                    model.display_node_id = None;
                }
                Node::MarkupsToModel(module) if module.markups_node_id() == Some(id) => {
                    module.set_and_observe_markups_node_id(None);
                }
                _ => {}
            }
        }

        log::debug!("Removed {} from scene", id);
        self.notify(&SceneEvent::NodeRemoved(id.clone()));
        Some(node)
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.nodes)
            .field("observers", &self.observers.len())
            .field("batch_depth", &self.batch_depth)
            .finish()
    }
}
