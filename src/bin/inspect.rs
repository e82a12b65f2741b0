//! Inspection CLI: build the scene graph for a perception snapshot and show
//! its structure, optionally ranking every node against an intent.

use clap::Parser;
use viga::{
    embeddings::ConfiguredEmbedder,
    graph::{NodeKind, Relation},
    grounding::describe_candidate,
    perception::{PerceptionSource, SnapshotSource},
    Config, GraphBuilder, GroundingEngine,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inspect", about = "Inspect the scene graph built from a perception snapshot")]
struct Args {
    /// Snapshot JSON (default: perception.snapshot_path from config).
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Print the whole graph as JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Rank every node against this intent with the configured embedder.
    #[arg(long)]
    intent: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = Config::load()?;

    let snapshot = args
        .snapshot
        .unwrap_or_else(|| config.snapshot_path().to_path_buf());
    let data = SnapshotSource::new(&snapshot).perceive()?;
    let graph = GraphBuilder::from_config(&config.graph).build_graph(&data)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&graph)?);
        return Ok(());
    }

    println!("Snapshot: {}", snapshot.display());
    println!(
        "Nodes: {} ({} layouts, {} elements, {} text)",
        graph.len(),
        data.layouts.len(),
        data.elements.len(),
        data.text.len()
    );
    println!(
        "Edges: {} ({} parent_of, {} near)",
        graph.edges().len(),
        graph.edges_with(Relation::ParentOf).count(),
        graph.edges_with(Relation::Near).count()
    );

    println!("\nHierarchy:");
    for layout in graph.nodes().iter().filter(|n| n.kind() == NodeKind::Layout) {
        println!("  {} '{}'", layout.id, layout.semantic_label);
        for child in graph.children(&layout.id) {
            println!("    └─ {} '{}'", child.id, child.semantic_label);
        }
    }

    let orphans: Vec<_> = graph
        .nodes()
        .iter()
        .filter(|n| n.kind() != NodeKind::Layout && graph.parents(&n.id).is_empty())
        .collect();
    if !orphans.is_empty() {
        println!("  (no container)");
        for node in orphans {
            println!("    · {} '{}'", node.id, describe_candidate(&graph, node));
        }
    }

    if let Some(intent) = args.intent {
        let engine = GroundingEngine::new(ConfiguredEmbedder::from_config(&config.embeddings)?);
        let mut ranked = engine.rank(&intent, &graph).await?;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        println!("\nCandidates for \"{}\":", intent);
        for (rank, candidate) in ranked.iter().enumerate() {
            println!(
                "  #{:<2} {:>7.3}  {:<12} {}",
                rank + 1,
                candidate.score,
                candidate.node_id,
                candidate.description
            );
        }
    }

    Ok(())
}
