//! Pipeline orchestration: perceive, build the scene graph, ground the intent,
//! act. One shot per command, no retries.

use crate::config::Config;
use crate::embeddings::{ConfiguredEmbedder, Embedder};
use crate::error::Result;
use crate::execution::{plan_action, ActionPlan, Executor, SimulatedExecutor};
use crate::graph::{GraphBuilder, SceneGraph};
use crate::grounding::{describe_candidate, Grounding, GroundingEngine};
use crate::perception::{PerceptionSource, SnapshotSource};
use std::time::{Duration, Instant};

/// What one pipeline run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub graph: SceneGraph,
    pub grounding: Grounding,
    /// Set only when the grounding cleared the confidence threshold
    pub plan: Option<ActionPlan>,
    /// Perception through grounding, excluding execution
    pub latency: Duration,
}

impl RunReport {
    pub fn acted(&self) -> bool {
        self.plan.is_some()
    }
}

pub struct Agent<S, E, X> {
    perception: S,
    builder: GraphBuilder,
    grounder: GroundingEngine<E>,
    executor: X,
    min_confidence: f32,
}

impl Agent<SnapshotSource, ConfiguredEmbedder, SimulatedExecutor> {
    /// Wire the default collaborators from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = ConfiguredEmbedder::from_config(&config.embeddings)?;
        log::info!("Embedding provider: {}", embedder.name());

        Ok(Agent::new(
            SnapshotSource::new(config.snapshot_path()),
            GraphBuilder::from_config(&config.graph),
            GroundingEngine::new(embedder),
            SimulatedExecutor,
            config.grounding.min_confidence,
        ))
    }
}

impl<S, E, X> Agent<S, E, X>
where
    S: PerceptionSource,
    E: Embedder,
    X: Executor,
{
    pub fn new(
        perception: S,
        builder: GraphBuilder,
        grounder: GroundingEngine<E>,
        executor: X,
        min_confidence: f32,
    ) -> Self {
        Self {
            perception,
            builder,
            grounder,
            executor,
            min_confidence,
        }
    }

    /// Run the pipeline for `intent`, reporting success as a boolean.
    ///
    /// Every error is logged here and turned into `false`.
    pub async fn run_command(&self, intent: &str) -> bool {
        println!("\n[Goal] {}", intent);
        match self.run(intent).await {
            Ok(report) => report.acted(),
            Err(e) => {
                log::error!("Pipeline failed for intent {:?}: {}", intent, e);
                println!("      CRITICAL ERROR in agent loop: {}", e);
                false
            }
        }
    }

    /// Run the pipeline for `intent`, propagating errors.
    pub async fn run(&self, intent: &str) -> Result<RunReport> {
        let start = Instant::now();

        println!("[1/4] Perceiving UI...");
        let data = self.perception.perceive()?;
        log::debug!(
            "Perceived {} layouts, {} elements, {} text",
            data.layouts.len(),
            data.elements.len(),
            data.text.len()
        );

        println!("[2/4] Constructing hierarchical UI graph...");
        let graph = self.builder.build_graph(&data)?;
        println!("      {} nodes, {} edges", graph.len(), graph.edges().len());

        println!("[3/4] Grounding intent to structured scene...");
        let grounding = self.grounder.ground(intent, &graph).await?;

        let latency = start.elapsed();
        println!("      Pipeline latency: {:.2}ms", latency.as_secs_f64() * 1000.0);

        if !grounding.is_reliable(self.min_confidence) {
            println!("      FAILED: Could not find a reliable semantic match in the UI scene.");
            log::info!(
                "Best match {:?} scored {:.3}, threshold {:.2}",
                grounding.node_id,
                grounding.confidence,
                self.min_confidence
            );
            return Ok(RunReport {
                graph,
                grounding,
                plan: None,
                latency,
            });
        }

        let plan = plan_action(&graph, &grounding)?;
        if let Some(plan) = &plan {
            if let Some(node) = graph.node(&plan.node_id) {
                println!(
                    "      Matched: '{}' (Conf: {:.2})",
                    describe_candidate(&graph, node),
                    grounding.confidence
                );
            }
            println!(
                "[4/4] Grounded action: {} at ({:.1}, {:.1})...",
                plan.action, plan.point.0, plan.point.1
            );
            self.executor.execute(plan)?;
            println!("      Action simulation successful.");
        }

        Ok(RunReport {
            graph,
            grounding,
            plan,
            latency,
        })
    }
}
