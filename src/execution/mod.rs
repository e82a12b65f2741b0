//! Action consumer: turns a grounding into a concrete on-screen action.
//!
//! Input delivery itself is out of scope; [`SimulatedExecutor`] logs what
//! would be done.

use crate::error::{Result, VigaError};
use crate::graph::{BoundingBox, SceneGraph};
use crate::grounding::{ActionKind, Grounding};
use serde::Serialize;

/// A resolved action: what to do and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub node_id: String,
    pub action: ActionKind,
    /// Screen coordinate `(x, y)` at the center of the target box
    pub point: (f64, f64),
}

/// Center point of a box
pub fn center(bbox: &BoundingBox) -> (f64, f64) {
    bbox.center()
}

/// Resolve `grounding` against the graph it came from.
///
/// Returns `Ok(None)` when nothing was grounded. A node id that is not in
/// `graph` means the grounding belongs to another build and is rejected.
pub fn plan_action(graph: &SceneGraph, grounding: &Grounding) -> Result<Option<ActionPlan>> {
    let Some(node_id) = grounding.node_id.as_deref() else {
        return Ok(None);
    };

    let node = graph.node(node_id).ok_or_else(|| {
        VigaError::InvalidInput(format!("Grounded node {} is not in the scene graph", node_id))
    })?;

    Ok(Some(ActionPlan {
        node_id: node_id.to_string(),
        action: grounding.action.unwrap_or(ActionKind::Click),
        point: center(&node.bbox),
    }))
}

/// Delivers planned actions.
pub trait Executor {
    fn execute(&self, plan: &ActionPlan) -> Result<()>;
}

/// Logs actions instead of injecting input.
#[derive(Debug, Default, Clone)]
pub struct SimulatedExecutor;

impl Executor for SimulatedExecutor {
    fn execute(&self, plan: &ActionPlan) -> Result<()> {
        let (x, y) = plan.point;
        log::info!(
            "Simulated {} on {} at ({:.1}, {:.1})",
            plan.action,
            plan.node_id,
            x,
            y
        );
        Ok(())
    }
}
