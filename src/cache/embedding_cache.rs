use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};

/// Thread-safe LRU cache of text embeddings
///
/// Candidate descriptions repeat heavily from one perception frame to the next
/// ("OK inside dialog", "search"), so the encoder keeps recent vectors keyed by
/// the exact input text.
pub struct EmbeddingCache {
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl EmbeddingCache {
    /// Create a new embedding cache holding at most `capacity` vectors.
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Vec<f32>>> {
        // A panic while holding the lock cannot leave the LRU half-updated
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached embedding for `text`, refreshing its LRU position
    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.lock().get(text).cloned()
    }

    pub fn put(&self, text: String, embedding: Vec<f32>) {
        self.lock().put(text, embedding);
    }

    /// Look up every text at once. The result is aligned with `texts`.
    pub fn get_many(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let mut cache = self.lock();
        texts.iter().map(|t| cache.get(t.as_str()).cloned()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}
