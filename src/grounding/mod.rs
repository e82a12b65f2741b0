//! Intent grounding: pick the scene node that best matches a natural-language
//! instruction and infer what to do with it.

mod action;

pub use action::{infer_action, ActionKind};

use crate::embeddings::Embedder;
use crate::error::{Result, VigaError};
use crate::graph::{Node, SceneGraph};
use serde::Serialize;

/// Outcome of grounding one intent against one scene graph.
///
/// `confidence` is the raw cosine similarity of the winner and is not clamped.
/// Whether it is good enough to act on is the caller's decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grounding {
    pub node_id: Option<String>,
    pub confidence: f32,
    pub action: Option<ActionKind>,
}

impl Grounding {
    /// No candidate: `(None, 0.0, None)`
    pub fn none() -> Self {
        Self {
            node_id: None,
            confidence: 0.0,
            action: None,
        }
    }

    /// True when a node was matched with confidence strictly above `min_confidence`
    pub fn is_reliable(&self, min_confidence: f32) -> bool {
        self.node_id.is_some() && self.confidence > min_confidence
    }
}

/// One scored candidate, in graph enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub node_id: String,
    pub description: String,
    pub score: f32,
}

/// Matches intents to scene nodes through a semantic encoder.
///
/// Holds no per-call state; safe to share as long as the encoder is.
pub struct GroundingEngine<E> {
    embedder: E,
}

impl<E: Embedder> GroundingEngine<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Ground `intent` to the best-matching node of `graph`.
    ///
    /// An empty graph yields [`Grounding::none`] without touching the encoder.
    /// Ties go to the node enumerated first. Scores that are all NaN mean the
    /// encoder output is unusable and fail with [`VigaError::Embedding`].
    pub async fn ground(&self, intent: &str, graph: &SceneGraph) -> Result<Grounding> {
        if graph.is_empty() {
            return Ok(Grounding::none());
        }

        let candidates = self.rank(intent, graph).await?;
        let scores: Vec<f32> = candidates.iter().map(|c| c.score).collect();

        let Some(best) = stable_argmax(&scores) else {
            return Err(VigaError::Embedding(format!(
                "No comparable similarity scores for intent {:?} across {} candidates",
                intent,
                scores.len()
            )));
        };

        let winner = &candidates[best];
        let node = graph.node(&winner.node_id).ok_or_else(|| {
            VigaError::InvalidInput(format!("Node {} vanished from graph", winner.node_id))
        })?;
        let action = infer_action(intent, node);

        log::debug!(
            "Grounded {:?} -> {} ({:?}, score {:.3}, action {})",
            intent,
            winner.node_id,
            winner.description,
            winner.score,
            action
        );

        Ok(Grounding {
            node_id: Some(winner.node_id.clone()),
            confidence: winner.score,
            action: Some(action),
        })
    }

    /// Score every node against `intent`, in enumeration order.
    ///
    /// The intent and all candidate descriptions go to the encoder in a single
    /// batch.
    pub async fn rank(&self, intent: &str, graph: &SceneGraph) -> Result<Vec<Candidate>> {
        if graph.is_empty() {
            return Ok(Vec::new());
        }

        let descriptions: Vec<String> = graph
            .nodes()
            .iter()
            .map(|node| describe_candidate(graph, node))
            .collect();

        let mut texts = Vec::with_capacity(descriptions.len() + 1);
        texts.push(intent.to_string());
        texts.extend(descriptions.iter().cloned());

        let start = std::time::Instant::now();
        let embeddings = self.embedder.embed_batch(texts).await?;
        log::debug!(
            "Encoded intent and {} candidates in {:?}",
            descriptions.len(),
            start.elapsed()
        );

        if embeddings.len() != descriptions.len() + 1 {
            return Err(VigaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                descriptions.len() + 1,
                embeddings.len()
            )));
        }

        let (intent_vec, candidate_vecs) = embeddings.split_at(1);
        let intent_vec = &intent_vec[0];

        graph
            .nodes()
            .iter()
            .zip(descriptions)
            .zip(candidate_vecs)
            .map(|((node, description), vector)| {
                if vector.len() != intent_vec.len() {
                    return Err(VigaError::Embedding(format!(
                        "Embedding dimension mismatch: intent {}, {} {}",
                        intent_vec.len(),
                        node.id,
                        vector.len()
                    )));
                }
                Ok(Candidate {
                    node_id: node.id.clone(),
                    description,
                    score: cosine_similarity(intent_vec, vector),
                })
            })
            .collect()
    }
}

/// Node label plus the label of its first containing layout.
///
/// "Submit" inside a form becomes "Submit inside form", which separates
/// identically labelled elements by context. Only the first parent in edge
/// order is used.
pub fn describe_candidate(graph: &SceneGraph, node: &Node) -> String {
    let base = node.display_label();
    match graph.parents(&node.id).first() {
        Some(parent) => {
            let context = if parent.semantic_label.is_empty() {
                "container"
            } else {
                parent.semantic_label.as_str()
            };
            format!("{} inside {}", base, context)
        }
        None => base.to_string(),
    }
}

/// Compute cosine similarity between two vectors of the same length
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();

    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Index of the first maximum. NaN scores never win.
fn stable_argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }
    best.map(|(i, _)| i)
}
