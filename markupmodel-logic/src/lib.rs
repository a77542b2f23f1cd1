//! # markupmodel Logic
//!
//! Turns the fiducials referenced by a markups-to-model module node into a
//! registered surface model.
//!
//! ```no_run
//! use markupmodel_logic::MarkupsToModelLogic;
//! use markupmodel_scene::{MarkupsFiducialNode, MarkupsToModelNode, NodeRegistry, Scene};
//! use markupmodel_core::Point3f;
//!
//! let mut scene = Scene::new();
//! let mut markups = MarkupsFiducialNode::new("F");
//! for p in [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]] {
//!     markups.add_fiducial(Point3f::new(p[0], p[1], p[2]));
//! }
//! let markups_id = scene.add_node(markups.into());
//! let module_id = scene.add_node(MarkupsToModelNode::new("MarkupsToModel").into());
//!
//! let logic = MarkupsToModelLogic::default();
//! logic.set_markups_node(&mut scene, Some(&markups_id), Some(&module_id));
//! let output = logic.update_output_model(&mut scene, &module_id).unwrap();
//! println!("model {} shown by {}", output.model_node_id, output.display_node_id);
//! ```

use markupmodel_core::{Error, Point3f, Result};
use markupmodel_reconstruction::{
    ReconstructionConfig, ReconstructionWarning, StageReport, SurfaceReconstructor,
};
use markupmodel_scene::{
    ModelDisplayNode, ModelNode, Node, NodeId, NodeRegistry, ObserverId, Scene, SceneEvent,
};

/// Outcome of [`MarkupsToModelLogic::set_markups_node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The module node now observes the new markups
    Updated,
    /// The module node already observed these markups
    Unchanged,
    /// Invalid input; nothing was changed
    Rejected,
}

/// The pair of nodes registered for one reconstruction
#[derive(Debug, Clone)]
pub struct OutputModel {
    pub model_node_id: NodeId,
    pub display_node_id: NodeId,
    pub report: StageReport,
    pub warnings: Vec<ReconstructionWarning>,
}

/// Logic of the markups-to-model module
#[derive(Debug, Clone, Default)]
pub struct MarkupsToModelLogic {
    reconstructor: SurfaceReconstructor,
}

impl MarkupsToModelLogic {
    pub fn new(config: ReconstructionConfig) -> Self {
        Self {
            reconstructor: SurfaceReconstructor::new(config),
        }
    }

    pub fn config(&self) -> &ReconstructionConfig {
        self.reconstructor.config()
    }

    /// Log node and batch events of `scene`
    pub fn observe_scene(&self, scene: &mut Scene) -> ObserverId {
        scene.add_observer(|event| match event {
            SceneEvent::NodeAdded(id) => log::debug!("Scene node added: {}", id),
            SceneEvent::NodeRemoved(id) => log::debug!("Scene node removed: {}", id),
            SceneEvent::EndBatchProcess => log::debug!("Scene batch processing ended"),
            SceneEvent::StartBatchProcess => {}
        })
    }

    /// Point a module node at a markups node, or clear it with `None`
    pub fn set_markups_node<R>(
        &self,
        registry: &mut R,
        new_markups: Option<&NodeId>,
        module_node: Option<&NodeId>,
    ) -> LinkOutcome
    where
        R: NodeRegistry + ?Sized,
    {
        let Some(module_id) = module_node else {
            log::warn!("set_markups_node: module node is invalid");
            return LinkOutcome::Rejected;
        };

        if let Some(markups_id) = new_markups {
            if registry.node(markups_id).and_then(Node::as_markups).is_none() {
                log::warn!("set_markups_node: {} is not a markups node", markups_id);
                return LinkOutcome::Rejected;
            }
        }

        let Some(module) = registry
            .node_mut(module_id)
            .and_then(Node::as_markups_to_model_mut)
        else {
            log::warn!("set_markups_node: module node {} is invalid", module_id);
            return LinkOutcome::Rejected;
        };

        if module.markups_node_id() == new_markups {
            return LinkOutcome::Unchanged;
        }

        module.set_and_observe_markups_node_id(new_markups.cloned());
        LinkOutcome::Updated
    }

    /// Rebuild the output model from the module node's markups
    pub fn update_output_model<R>(&self, registry: &mut R, module_node: &NodeId) -> Result<OutputModel>
    where
        R: NodeRegistry + ?Sized,
    {
        let module = registry
            .node(module_node)
            .and_then(Node::as_markups_to_model)
            .ok_or_else(|| Error::InvalidData(format!("{} is not a markups to model node", module_node)))?;

        let markups_id = module
            .markups_node_id()
            .ok_or_else(|| Error::InvalidData(format!("{} has no markups node", module_node)))?;

        let points = registry
            .node(markups_id)
            .and_then(Node::as_markups)
            .map(|markups| markups.positions())
            .ok_or_else(|| Error::InvalidData(format!("Markups node {} is missing", markups_id)))?;

        self.reconstruct_surface(&points, registry)
    }

    /// Reconstruct a surface from `points` and register it with its display
    ///
    /// All geometry is computed before the first node is added, so a failed
    /// reconstruction leaves the registry untouched. If the registry refuses
    /// the display link, both new nodes are removed again before the error is
    /// returned. Each call adds a new pair.
    pub fn reconstruct_surface<R>(&self, points: &[Point3f], registry: &mut R) -> Result<OutputModel>
    where
        R: NodeRegistry + ?Sized,
    {
        let surface = self.reconstructor.reconstruct(points)?;
        let config = self.reconstructor.config();

        let model = ModelNode::new(config.model_name.clone()).with_mesh(surface.mesh);
        let model_node_id = registry.add_node(model.into());

        let display = ModelDisplayNode::new(config.display_name());
        let display_node_id = registry.add_node(display.into());

        if let Err(e) = registry.set_display_node(&model_node_id, &display_node_id) {
            // Never leave a model without its display behind.
            registry.remove_node(&display_node_id);
            registry.remove_node(&model_node_id);
            return Err(e);
        }

        log::info!("Registered {} with display {}", model_node_id, display_node_id);

        Ok(OutputModel {
            model_node_id,
            display_node_id,
            report: surface.report,
            warnings: surface.warnings,
        })
    }
}
