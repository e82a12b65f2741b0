//! Semantic encoders used by grounding.
//!
//! The grounding engine only needs "one vector per input text, in order";
//! [`Embedder`] is that seam. [`ConfiguredEmbedder`] picks an implementation
//! from configuration at startup.

pub mod hashing;
pub mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::cache::EmbeddingCache;
use crate::config::EmbeddingsConfig;
use crate::error::{Result, VigaError};
use std::future::Future;
use std::sync::Arc;

/// Turns texts into vectors.
///
/// Implementations must return exactly one vector per input, in input order,
/// all of the same dimension.
pub trait Embedder: Send + Sync {
    fn embed_batch(&self, texts: Vec<String>) -> impl Future<Output = Result<Vec<Vec<f32>>>> + Send;
}

/// Embedder selected by `embeddings.provider`
pub enum ConfiguredEmbedder {
    OpenAI(OpenAIEmbedder),
    Hashing(HashingEmbedder),
}

impl ConfiguredEmbedder {
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        match config.provider.as_str() {
            "openai" => {
                let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                    VigaError::Config(format!(
                        "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                        config.api_key_env
                    ))
                })?;

                // Wrap in an LRU cache if cache_capacity > 0
                let cache = if config.cache_capacity > 0 {
                    Some(Arc::new(EmbeddingCache::new(config.cache_capacity)))
                } else {
                    None
                };

                let embedder = OpenAIEmbedder::new_with_cache(
                    api_key,
                    config.model.clone(),
                    config.batch_size,
                    cache,
                )?
                .with_base_url(&config.base_url)
                .with_max_retries(config.max_retries);

                Ok(Self::OpenAI(embedder))
            }
            "hashing" => Ok(Self::Hashing(HashingEmbedder::new(config.dimensions))),
            other => Err(VigaError::Config(format!(
                "Unknown embeddings provider: {}",
                other
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI(_) => "openai",
            Self::Hashing(_) => "hashing",
        }
    }
}

impl Embedder for ConfiguredEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match self {
            Self::OpenAI(e) => e.embed_batch(texts).await,
            Self::Hashing(e) => e.embed_batch(texts).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_hashing() {
        let config = EmbeddingsConfig {
            provider: "hashing".to_string(),
            dimensions: 64,
            ..Default::default()
        };
        let embedder = ConfiguredEmbedder::from_config(&config).unwrap();
        assert_eq!(embedder.name(), "hashing");
    }

    #[test]
    fn test_from_config_openai_without_key() {
        let config = EmbeddingsConfig {
            provider: "openai".to_string(),
            api_key_env: "VIGA_EMBEDDINGS_TEST_UNSET_KEY".to_string(),
            ..Default::default()
        };
        let err = ConfiguredEmbedder::from_config(&config).err().unwrap();
        assert!(err.to_string().contains("VIGA_EMBEDDINGS_TEST_UNSET_KEY"));
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = EmbeddingsConfig {
            provider: "clip".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ConfiguredEmbedder::from_config(&config),
            Err(VigaError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_configured_delegates() {
        let embedder = ConfiguredEmbedder::Hashing(HashingEmbedder::new(32));
        let vectors = embedder
            .embed_batch(vec!["open settings".to_string(), "close".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        assert!(vectors.iter().all(|v| v.len() == 32));
    }
}
