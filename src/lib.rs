pub mod agent;
pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod execution;
pub mod graph;
pub mod grounding;
pub mod perception;

pub use agent::{Agent, RunReport};
pub use config::Config;
pub use error::{Result, VigaError};
pub use graph::{GraphBuilder, Relation, SceneGraph};
pub use grounding::{ActionKind, Grounding, GroundingEngine};
pub use perception::PerceptionData;
