//! Scene graph construction from perception output.

use super::{BoundingBox, Node, NodeKind, NodePayload, Relation, SceneGraph};
use crate::config::GraphConfig;
use crate::error::{Result, VigaError};
use crate::perception::{DetectionItem, PerceptionData, TextItem};

/// Default slack (in pixels) applied to layout boxes for containment
pub const DEFAULT_CONTAINMENT_TOLERANCE: f64 = 5.0;

/// Default center-to-center distance (in pixels) under which nodes are `near`
pub const DEFAULT_PROXIMITY_THRESHOLD: f64 = 80.0;

/// Builds a [`SceneGraph`] from one frame of perception data.
///
/// Holds configuration only; every call returns a fresh graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    proximity_threshold: f64,
    containment_tolerance: f64,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD, DEFAULT_CONTAINMENT_TOLERANCE)
    }
}

impl GraphBuilder {
    pub fn new(proximity_threshold: f64, containment_tolerance: f64) -> Self {
        Self {
            proximity_threshold,
            containment_tolerance,
        }
    }

    pub fn from_config(config: &GraphConfig) -> Self {
        Self::new(config.proximity_threshold, config.containment_tolerance)
    }

    pub fn proximity_threshold(&self) -> f64 {
        self.proximity_threshold
    }

    pub fn containment_tolerance(&self) -> f64 {
        self.containment_tolerance
    }

    /// Build the scene graph for `data`.
    ///
    /// Every box is validated before the first node is created, so a malformed
    /// item fails the whole build with [`VigaError::Validation`].
    pub fn build_graph(&self, data: &PerceptionData) -> Result<SceneGraph> {
        let start = std::time::Instant::now();

        let nodes = create_nodes(data)?;
        let mut graph = SceneGraph::with_capacity(nodes.len());
        for node in nodes {
            graph.add_node(node);
        }

        let hierarchy = self.establish_hierarchy(&mut graph);
        let proximity = self.add_spatial_relationships(&mut graph);

        log::debug!(
            "Built scene graph in {:?}: {} nodes, {} parent_of, {} near",
            start.elapsed(),
            graph.len(),
            hierarchy,
            proximity
        );

        Ok(graph)
    }

    /// Link every layout to each non-layout node its box contains.
    fn establish_hierarchy(&self, graph: &mut SceneGraph) -> usize {
        let (layouts, others): (Vec<usize>, Vec<usize>) =
            (0..graph.len()).partition(|&i| graph.nodes()[i].kind() == NodeKind::Layout);

        let mut added = 0;
        for &l in &layouts {
            let outer = graph.nodes()[l].bbox;
            for &o in &others {
                let inner = graph.nodes()[o].bbox;
                if outer.contains_within(&inner, self.containment_tolerance)
                    && graph.add_edge(l, o, Relation::ParentOf)
                {
                    added += 1;
                }
            }
        }
        added
    }

    /// Add a `near` edge for every still-unlinked pair whose centers are close.
    ///
    /// Quadratic in node count. Pairs are visited in enumeration order and the
    /// edge points from the lower to the higher index.
    fn add_spatial_relationships(&self, graph: &mut SceneGraph) -> usize {
        let n = graph.len();
        let mut added = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if graph.is_linked(i, j) {
                    continue;
                }
                let distance = graph.nodes()[i].bbox.center_distance(&graph.nodes()[j].bbox);
                if distance < self.proximity_threshold && graph.add_edge(i, j, Relation::Near) {
                    added += 1;
                }
            }
        }
        added
    }
}

fn create_nodes(data: &PerceptionData) -> Result<Vec<Node>> {
    let mut nodes = Vec::with_capacity(data.len());

    for (i, item) in data.layouts.iter().enumerate() {
        nodes.push(detection_node(NodeKind::Layout, i, item)?);
    }
    for (i, item) in data.elements.iter().enumerate() {
        nodes.push(detection_node(NodeKind::Element, i, item)?);
    }
    for (i, item) in data.text.iter().enumerate() {
        nodes.push(text_node(i, item)?);
    }

    Ok(nodes)
}

fn node_id(kind: NodeKind, index: usize) -> String {
    format!("{}_{}", kind.as_str(), index)
}

fn detection_node(kind: NodeKind, index: usize, item: &DetectionItem) -> Result<Node> {
    let id = node_id(kind, index);
    let bbox = BoundingBox::from_coords(&item.bbox)
        .map_err(|e| VigaError::Validation(format!("{}: {}", id, e)))?;
    check_confidence(&id, item.confidence)?;

    let semantic_label = item
        .semantic_tag
        .as_deref()
        .filter(|tag| !tag.trim().is_empty())
        .unwrap_or(&item.class_name)
        .to_string();

    let class_name = item.class_name.clone();
    let payload = match kind {
        NodeKind::Layout => NodePayload::Layout { class_name },
        _ => NodePayload::Element { class_name },
    };

    Ok(Node {
        id,
        bbox,
        confidence: item.confidence,
        semantic_label,
        payload,
    })
}

fn text_node(index: usize, item: &TextItem) -> Result<Node> {
    let id = node_id(NodeKind::Text, index);
    let bbox = BoundingBox::from_polygon(&item.polygon)
        .map_err(|e| VigaError::Validation(format!("{}: {}", id, e)))?;
    check_confidence(&id, item.confidence)?;

    Ok(Node {
        id,
        bbox,
        confidence: item.confidence,
        semantic_label: item.text.clone(),
        payload: NodePayload::Text {
            text: item.text.clone(),
        },
    })
}

fn check_confidence(id: &str, confidence: f64) -> Result<()> {
    if !confidence.is_finite() {
        return Err(VigaError::Validation(format!(
            "{}: non-finite confidence {}",
            id, confidence
        )));
    }
    Ok(())
}
