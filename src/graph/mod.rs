//! Scene graph module: typed nodes, directed relations and the builder that
//! infers them from perception output.
//!
//! The graph is rebuilt from scratch on every perception cycle; node ids are
//! only stable within a single build.

mod builder;
mod geometry;

pub use builder::{GraphBuilder, DEFAULT_CONTAINMENT_TOLERANCE, DEFAULT_PROXIMITY_THRESHOLD};
pub use geometry::BoundingBox;

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Relation carried by a directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    /// Source layout geometrically contains the target.
    ParentOf,
    /// Box centers lie within the proximity threshold.
    Near,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::ParentOf => "parent_of",
            Relation::Near => "near",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edge in the scene graph (source --relation--> target).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub relation: Relation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Layout,
    Element,
    Text,
}

impl NodeKind {
    /// Prefix used when assigning node ids
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Layout => "layout",
            NodeKind::Element => "element",
            NodeKind::Text => "text",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific node attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodePayload {
    Layout { class_name: String },
    Element { class_name: String },
    Text { text: String },
}

/// A typed node in the scene graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
    pub confidence: f64,
    /// Display label resolved at build time (semantic tag, class name, raw text).
    pub semantic_label: String,
    #[serde(flatten)]
    pub payload: NodePayload,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self.payload {
            NodePayload::Layout { .. } => NodeKind::Layout,
            NodePayload::Element { .. } => NodeKind::Element,
            NodePayload::Text { .. } => NodeKind::Text,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Layout { class_name } | NodePayload::Element { class_name } => {
                Some(class_name)
            }
            NodePayload::Text { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::Text { text } => Some(text),
            _ => None,
        }
    }

    /// Label used for matching: semantic label, then raw text, then class name.
    pub fn display_label(&self) -> &str {
        [Some(self.semantic_label.as_str()), self.text(), self.class_name()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or("")
    }
}

/// Directed relation graph over the nodes of one perception frame.
///
/// Nodes keep their enumeration order (layouts, elements, text); edges keep
/// insertion order. At most one edge exists per unordered node pair.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    linked: HashSet<(usize, usize)>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(nodes),
            edges: Vec::new(),
            index: HashMap::with_capacity(nodes),
            linked: HashSet::new(),
        }
    }

    /// Append a node and return its index. Ids must be unique.
    pub(crate) fn add_node(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        idx
    }

    /// Add `source --relation--> target` unless the pair is already linked in
    /// either direction. Returns whether the edge was added.
    pub(crate) fn add_edge(&mut self, source: usize, target: usize, relation: Relation) -> bool {
        if source == target || !self.linked.insert(pair_key(source, target)) {
            return false;
        }
        self.edges.push(Edge {
            source: self.nodes[source].id.clone(),
            target: self.nodes[target].id.clone(),
            relation,
        });
        true
    }

    pub(crate) fn is_linked(&self, a: usize, b: usize) -> bool {
        self.linked.contains(&pair_key(a, b))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    /// Position of a node in enumeration order
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn has_edge_between(&self, a: &str, b: &str) -> bool {
        match (self.index_of(a), self.index_of(b)) {
            (Some(a), Some(b)) => self.is_linked(a, b),
            _ => false,
        }
    }

    pub fn edges_with(&self, relation: Relation) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.relation == relation)
    }

    /// Containing layouts of `id`, in edge insertion order.
    pub fn parents(&self, id: &str) -> Vec<&Node> {
        self.edges_with(Relation::ParentOf)
            .filter(|e| e.target == id)
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    pub fn children(&self, id: &str) -> Vec<&Node> {
        self.edges_with(Relation::ParentOf)
            .filter(|e| e.source == id)
            .filter_map(|e| self.node(&e.target))
            .collect()
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
