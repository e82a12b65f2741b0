use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub grounding: GroundingConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub perception: PerceptionConfig,
}

/// Scene graph relation thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_proximity_threshold")]
    pub proximity_threshold: f64,
    #[serde(default = "default_containment_tolerance")]
    pub containment_tolerance: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: default_proximity_threshold(),
            containment_tolerance: default_containment_tolerance(),
        }
    }
}

fn default_proximity_threshold() -> f64 {
    crate::graph::DEFAULT_PROXIMITY_THRESHOLD
}

fn default_containment_tolerance() -> f64 {
    crate::graph::DEFAULT_CONTAINMENT_TOLERANCE
}

/// Grounding and caller-side acceptance policy
#[derive(Debug, Clone, Deserialize)]
pub struct GroundingConfig {
    /// Matches scoring at or below this are not acted on
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    /// Instruction used when the CLI receives no arguments
    #[serde(default = "default_intent")]
    pub default_intent: String,
}

impl Default for GroundingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            default_intent: default_intent(),
        }
    }
}

fn default_min_confidence() -> f32 {
    0.35
}

fn default_intent() -> String {
    "click the Windows Start button".to_string()
}

/// Embeddings configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    /// `openai` (any OpenAI-compatible endpoint) or `hashing` (offline)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Vector size for the hashing provider
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            cache_capacity: default_cache_capacity(),
            max_retries: default_max_retries(),
            dimensions: default_dimensions(),
        }
    }
}

fn default_provider() -> String {
    "hashing".to_string()
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    256
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_max_retries() -> usize {
    3
}

fn default_dimensions() -> usize {
    384
}

/// Where perception output is picked up
#[derive(Debug, Clone, Deserialize)]
pub struct PerceptionConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("perception.json")
}

impl Config {
    /// Load configuration from file
    ///
    /// Loads environment variables from .env file (if present) before loading config.
    /// Looks for config file in this order:
    /// 1. Path specified in VIGA_CONFIG environment variable
    /// 2. ./config.toml in current directory
    pub fn load() -> Result<Self> {
        // .env is optional
        let _ = dotenv::dotenv();

        let config_path = std::env::var("VIGA_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config.toml"));

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if !(self.graph.proximity_threshold.is_finite() && self.graph.proximity_threshold > 0.0) {
            anyhow::bail!("graph.proximity_threshold must be a positive number");
        }

        if !(self.graph.containment_tolerance.is_finite() && self.graph.containment_tolerance >= 0.0) {
            anyhow::bail!("graph.containment_tolerance must be zero or positive");
        }

        if !(-1.0..=1.0).contains(&self.grounding.min_confidence) {
            anyhow::bail!("grounding.min_confidence must be between -1.0 and 1.0");
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }

        match self.embeddings.provider.as_str() {
            "hashing" => {
                if self.embeddings.dimensions == 0 {
                    anyhow::bail!("embeddings.dimensions must be greater than 0");
                }
            }
            "openai" => {
                std::env::var(&self.embeddings.api_key_env).with_context(|| {
                    format!(
                        "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                        self.embeddings.api_key_env
                    )
                })?;
            }
            other => anyhow::bail!(
                "embeddings.provider must be \"openai\" or \"hashing\", got \"{}\"",
                other
            ),
        }

        Ok(())
    }

    /// Get the perception snapshot path
    pub fn snapshot_path(&self) -> &Path {
        &self.perception.snapshot_path
    }
}
