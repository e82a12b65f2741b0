use super::Embedder;
use crate::cache::EmbeddingCache;
use crate::error::{Result, VigaError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Request structure for the OpenAI embeddings API
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response structure from the OpenAI embeddings API
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Client for OpenAI-compatible embedding endpoints
///
/// Sends inputs in batches, retries rate-limit and server errors with
/// exponential backoff, and optionally serves repeated texts from an LRU cache.
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    batch_size: usize,
    max_retries: usize,
    cache: Option<Arc<EmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create a new embedder without caching
    ///
    /// # Arguments
    ///
    /// * `api_key` - API key sent as a bearer token
    /// * `model` - Model name (e.g., "text-embedding-3-small")
    /// * `batch_size` - Maximum number of texts to send per API request (max 2048)
    pub fn new(api_key: String, model: String, batch_size: usize) -> Result<Self> {
        Self::new_with_cache(api_key, model, batch_size, None)
    }

    /// Create a new embedder with an optional embedding cache
    pub fn new_with_cache(
        api_key: String,
        model: String,
        batch_size: usize,
        cache: Option<Arc<EmbeddingCache>>,
    ) -> Result<Self> {
        // Stay inside the API's per-request input limit
        let batch_size = batch_size.clamp(1, 2048);

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VigaError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            batch_size,
            max_retries: 3,
            cache,
        })
    }

    /// Point the client at another OpenAI-compatible server
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    /// Embed texts in order, consulting the cache first and sending only misses.
    async fn embed_all(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut slots: Vec<Option<Vec<f32>>> = match &self.cache {
            Some(cache) => cache.get_many(&texts),
            None => vec![None; texts.len()],
        };

        let misses: Vec<usize> = (0..texts.len()).filter(|&i| slots[i].is_none()).collect();
        if misses.len() < texts.len() {
            log::debug!("Embedding cache: {} hits, {} misses", texts.len() - misses.len(), misses.len());
        }

        for chunk in misses.chunks(self.batch_size) {
            let inputs: Vec<String> = chunk.iter().map(|&i| texts[i].clone()).collect();
            let embeddings = self.embed_with_retry(&inputs).await?;

            for (&i, embedding) in chunk.iter().zip(embeddings) {
                if let Some(cache) = &self.cache {
                    cache.put(texts[i].clone(), embedding.clone());
                }
                slots[i] = Some(embedding);
            }

            // Rate limiting: small delay between full batches
            if chunk.len() == self.batch_size && misses.len() > self.batch_size {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.ok_or_else(|| VigaError::Embedding(format!("Missing embedding for input {}", i)))
            })
            .collect()
    }

    /// Make a single API request
    ///
    /// Returns one embedding per input, ordered by the response `index` field
    /// when the server provides it.
    async fn embed_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| VigaError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());

            return Err(VigaError::Embedding(format!(
                "Embedding API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| VigaError::Embedding(format!("Failed to parse response: {}", e)))?;

        if result.data.len() != texts.len() {
            return Err(VigaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let mut data = result.data;
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }

        Ok(data.into_iter().map(|d| d.embedding).collect())
    }

    /// One request with retry on 429 and 5xx responses
    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.embed_request(texts).await {
                Ok(embeddings) => {
                    log::debug!(
                        "Embedding API call for {} texts took {:?} (attempt {})",
                        texts.len(),
                        start.elapsed(),
                        attempt + 1
                    );
                    return Ok(embeddings);
                }
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    log::warn!("Retry {}/{} after error: {}", attempt + 1, self.max_retries, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Rate limits and server errors are worth retrying; everything else is not.
fn is_retryable(err: &VigaError) -> bool {
    let msg = err.to_string();
    ["429", "500", "502", "503", "504"]
        .iter()
        .any(|code| msg.contains(&format!("API error {}", code)))
}

impl Embedder for OpenAIEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        self.embed_all(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    fn embedder(batch_size: usize) -> OpenAIEmbedder {
        OpenAIEmbedder::new("test-key".to_string(), "text-embedding-3-small".to_string(), batch_size).unwrap()
    }

    /// Talk to the mock server directly even if the environment sets a proxy.
    fn local(mut e: OpenAIEmbedder, base_url: &str) -> OpenAIEmbedder {
        e.client = Client::builder().no_proxy().build().unwrap();
        e.with_base_url(base_url)
    }

    #[test]
    fn test_embedder_new() {
        let e = embedder(100);
        assert_eq!(e.model, "text-embedding-3-small");
        assert_eq!(e.batch_size, 100);
        assert_eq!(e.endpoint(), "https://api.openai.com/v1/embeddings");
    }

    #[test]
    fn test_embedder_batch_size_limits() {
        assert_eq!(embedder(5000).batch_size, 2048);
        assert_eq!(embedder(2048).batch_size, 2048);
        assert_eq!(embedder(0).batch_size, 1);
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let e = embedder(10).with_base_url("http://localhost:8080/v1/");
        assert_eq!(e.endpoint(), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn test_is_retryable() {
        assert!(is_retryable(&VigaError::Embedding(
            "Embedding API error 429 Too Many Requests: slow down".to_string()
        )));
        assert!(is_retryable(&VigaError::Embedding(
            "Embedding API error 503 Service Unavailable: ".to_string()
        )));
        assert!(!is_retryable(&VigaError::Embedding(
            "Embedding API error 401 Unauthorized: bad key".to_string()
        )));
        assert!(!is_retryable(&VigaError::Embedding("Network error: refused".to_string())));
    }

    /// Answers every request with one 2-d vector per input, `[input length,
    /// request number]`, listed in reverse index order.
    async fn mock_embeddings(
        State(requests): State<Arc<AtomicUsize>>,
        Json(request): Json<Value>,
    ) -> Json<Value> {
        let n = requests.fetch_add(1, Ordering::SeqCst) + 1;
        let inputs = request["input"].as_array().cloned().unwrap_or_default();
        let data: Vec<Value> = inputs
            .iter()
            .enumerate()
            .rev()
            .map(|(i, input)| {
                let len = input.as_str().map_or(0, str::len) as f32;
                json!({"index": i, "embedding": [len, n as f32]})
            })
            .collect();
        Json(json!({ "data": data }))
    }

    async fn spawn_mock_server(requests: Arc<AtomicUsize>) -> String {
        let app = Router::new()
            .route("/v1/embeddings", post(mock_embeddings))
            .with_state(requests);
        serve(app).await
    }

    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/v1", addr)
    }

    #[tokio::test]
    async fn test_embed_batch_splits_and_orders() {
        let requests = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_mock_server(requests.clone()).await;
        let e = local(embedder(2), &base_url);

        let texts: Vec<String> = ["a", "bb", "ccc"].iter().map(|s| s.to_string()).collect();
        let vectors = e.embed_batch(texts).await.unwrap();

        assert_eq!(requests.load(Ordering::SeqCst), 2);
        let lengths: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
        assert_eq!(lengths, vec![1.0, 2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_embed_batch_serves_repeats_from_cache() {
        let requests = Arc::new(AtomicUsize::new(0));
        let base_url = spawn_mock_server(requests.clone()).await;
        let cache = Arc::new(EmbeddingCache::new(16));
        let e = OpenAIEmbedder::new_with_cache(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            8,
            Some(cache.clone()),
        )
        .unwrap();
        let e = local(e, &base_url);

        let first = e
            .embed_batch(vec!["Submit inside form".to_string(), "form".to_string()])
            .await
            .unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 2);

        let second = e
            .embed_batch(vec!["click submit".to_string(), "Submit inside form".to_string()])
            .await
            .unwrap();
        // Only "click submit" went over the wire
        assert_eq!(requests.load(Ordering::SeqCst), 2);
        assert_eq!(second[1], first[0]);
        assert_eq!(second[0], vec![12.0, 2.0]);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = requests.clone();
        let app = Router::new().route(
            "/v1/embeddings",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::UNAUTHORIZED, "bad key")
                }
            }),
        );
        let e = local(embedder(8), &serve(app).await);

        let err = e.embed_batch(vec!["home".to_string()]).await.unwrap_err();
        assert_eq!(requests.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_embed_batch_empty_makes_no_request() {
        let e = embedder(8).with_base_url("http://127.0.0.1:9");
        assert!(e.embed_batch(Vec::new()).await.unwrap().is_empty());
    }
}
