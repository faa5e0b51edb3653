//! Model cache
//!
//! Bounds how stale a served model may be. With a zero TTL every request
//! goes back to the registry; with a positive TTL a loaded predictor is
//! reused until it expires, and at most `max_entries` predictors stay
//! resident (least recently used evicted first).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::engine::Predictor;
use crate::error::Result;
use crate::registry::{LoadedModel, ModelRegistry, ModelUri};

/// Retry schedule for registry outages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubled on each subsequent one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

struct CacheEntry {
    predictor: Arc<Predictor>,
    loaded_at: Instant,
    last_accessed: Instant,
}

pub struct ModelCache {
    registry: Arc<dyn ModelRegistry>,
    entries: RwLock<HashMap<ModelUri, CacheEntry>>,
    ttl: Duration,
    max_entries: usize,
    retry: RetryPolicy,
}

impl ModelCache {
    /// Cache that reloads on every request and never retries
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self {
        Self {
            registry,
            entries: RwLock::new(HashMap::new()),
            ttl: Duration::ZERO,
            max_entries: 1,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get a predictor for `uri`, loading it if nothing fresh is cached
    pub async fn get_predictor(&self, uri: &ModelUri) -> Result<Arc<Predictor>> {
        if self.ttl.is_zero() {
            return Ok(Arc::new(Predictor::new(self.load_with_retry(uri).await?)));
        }

        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get_mut(uri) {
                if entry.loaded_at.elapsed() < self.ttl {
                    entry.last_accessed = Instant::now();
                    return Ok(Arc::clone(&entry.predictor));
                }
                tracing::debug!("Cached model for {} expired", uri);
                entries.remove(uri);
            }
        }

        let predictor = Arc::new(Predictor::new(self.load_with_retry(uri).await?));

        let mut entries = self.entries.write().await;
        while entries.len() >= self.max_entries {
            let lru = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(uri, _)| uri.clone());
            match lru {
                Some(uri) => {
                    tracing::info!("Evicting model: {}", uri);
                    entries.remove(&uri);
                }
                None => break,
            }
        }
        let now = Instant::now();
        entries.insert(
            uri.clone(),
            CacheEntry {
                predictor: Arc::clone(&predictor),
                loaded_at: now,
                last_accessed: now,
            },
        );

        Ok(predictor)
    }

    async fn load_with_retry(&self, uri: &ModelUri) -> Result<LoadedModel> {
        let mut attempt = 0;
        loop {
            match self.registry.load(uri).await {
                Ok(model) => return Ok(model),
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "Loading {} failed ({}); retry {}/{} in {:?}",
                        uri,
                        e,
                        attempt,
                        self.retry.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
