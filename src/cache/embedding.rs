//! Embedding cache: the single path to the embedding provider.
//!
//! Every component that needs a vector goes through here. Keys are the
//! normalized source text (lowercase + trim, optionally annotated with a
//! disambiguating context), so the same surface word can resolve to different
//! senses under different contexts. Strict LRU with lazy TTL expiry on read;
//! a hit costs well under a millisecond against a ~1 s provider round trip.
//!
//! Provider calls always happen outside the mutex; only the map mutation is
//! protected, so unrelated concurrent lookups never serialize behind the
//! network.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::constants::{DEFAULT_EMBEDDING_CACHE_CAPACITY, DEFAULT_EMBEDDING_CACHE_TTL_SECS};
use crate::provider::{EmbeddingProvider, EmbeddingVector, ProviderError, ProviderResult};

/// Hit/miss counters and occupancy for one cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads served from the cache.
    pub hits: u64,
    /// Reads that fell through to the provider.
    pub misses: u64,
    /// Current entry count.
    pub size: usize,
    /// Maximum entry count.
    pub capacity: usize,
}

impl CacheStats {
    /// Fraction of reads served from the cache (`0.0` before any read).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct Slot {
    vector: EmbeddingVector,
    stored_at: Instant,
    last_used: u64,
}

struct CacheState {
    entries: HashMap<String, Slot>,
    tick: u64,
    hits: u64,
    misses: u64,
}

/// LRU + TTL cache over an [`EmbeddingProvider`].
pub struct EmbeddingCache {
    state: Mutex<CacheState>,
    capacity: usize,
    ttl: Duration,
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingCache {
    /// Creates a cache with default capacity and TTL.
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_limits(
            provider,
            DEFAULT_EMBEDDING_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_EMBEDDING_CACHE_TTL_SECS),
        )
    }

    /// Creates a cache sized from config.
    pub fn from_config(provider: Arc<dyn EmbeddingProvider>, config: &Config) -> Self {
        Self::with_limits(
            provider,
            config.embedding_cache_capacity,
            config.embedding_cache_ttl,
        )
    }

    /// Creates a cache with explicit capacity and TTL.
    pub fn with_limits(
        provider: Arc<dyn EmbeddingProvider>,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(capacity.min(1024)),
                tick: 0,
                hits: 0,
                misses: 0,
            }),
            capacity,
            ttl,
            provider,
        }
    }

    /// Normalizes text into a cache key.
    pub fn normalize_key(text: &str) -> String {
        text.trim().to_lowercase()
    }

    /// Builds the annotated text for a word with disambiguating context.
    ///
    /// Different contexts for the same word are different cache keys; that is
    /// intentional, it is how one surface word resolves to different senses.
    pub fn contextual_text(word: &str, context: &[String]) -> String {
        if context.is_empty() {
            word.to_string()
        } else {
            format!("{} (in context: {})", word, context.join(", "))
        }
    }

    /// Returns the vector for `text`, fetching from the provider on a miss.
    pub async fn get(&self, text: &str) -> ProviderResult<EmbeddingVector> {
        let key = Self::normalize_key(text);

        if let Some(vector) = self.lookup(&key) {
            return Ok(vector);
        }

        let fetched = self.provider.embed_batch(&[text.to_string()]).await?;
        let vector = fetched
            .into_iter()
            .next()
            .ok_or(ProviderError::MalformedResponse {
                reason: "provider returned no embedding".to_string(),
            })?;

        self.store(key, vector.clone());
        Ok(vector)
    }

    /// Returns vectors for `texts` in input order.
    ///
    /// Hits are served from the cache; all misses go to the provider in a
    /// single batch call, then each result is inserted.
    pub async fn get_batch(&self, texts: &[String]) -> ProviderResult<Vec<EmbeddingVector>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<Option<EmbeddingVector>> = Vec::with_capacity(texts.len());
        // (position, key, original text)
        let mut misses: Vec<(usize, String, String)> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            let key = Self::normalize_key(text);
            match self.lookup(&key) {
                Some(vector) => results.push(Some(vector)),
                None => {
                    results.push(None);
                    misses.push((i, key, text.clone()));
                }
            }
        }

        if !misses.is_empty() {
            debug!(
                total = texts.len(),
                misses = misses.len(),
                "embedding batch partition"
            );

            let miss_texts: Vec<String> = misses.iter().map(|(_, _, t)| t.clone()).collect();
            let fetched = self.provider.embed_batch(&miss_texts).await?;

            if fetched.len() != misses.len() {
                return Err(ProviderError::MalformedResponse {
                    reason: format!(
                        "expected {} embeddings, got {}",
                        misses.len(),
                        fetched.len()
                    ),
                });
            }

            for ((i, key, _), vector) in misses.into_iter().zip(fetched) {
                self.store(key, vector.clone());
                results[i] = Some(vector);
            }
        }

        // Every None was filled from the provider batch above.
        Ok(results.into_iter().flatten().collect())
    }

    /// Returns the vector for `word` embedded with `context` annotation.
    pub async fn get_contextual(
        &self,
        word: &str,
        context: &[String],
    ) -> ProviderResult<EmbeddingVector> {
        let text = Self::contextual_text(word, context);
        self.get(&text).await
    }

    /// Current hit/miss counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            size: state.entries.len(),
            capacity: self.capacity,
        }
    }

    /// Drops all entries and resets counters.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hits = 0;
        state.misses = 0;
    }

    /// Cache read: refreshes recency on a hit, removes expired entries.
    fn lookup(&self, key: &str) -> Option<EmbeddingVector> {
        let mut state = self.state.lock();

        let expired = match state.entries.get(key) {
            Some(slot) => slot.stored_at.elapsed() > self.ttl,
            None => {
                state.misses += 1;
                return None;
            }
        };

        if expired {
            state.entries.remove(key);
            state.misses += 1;
            return None;
        }

        state.tick += 1;
        let tick = state.tick;
        state.hits += 1;
        if let Some(slot) = state.entries.get_mut(key) {
            slot.last_used = tick;
            return Some(slot.vector.clone());
        }
        None
    }

    fn store(&self, key: String, vector: EmbeddingVector) {
        let mut state = self.state.lock();

        while state.entries.len() >= self.capacity && !state.entries.contains_key(&key) {
            let oldest = state
                .entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    state.entries.remove(&k);
                }
                None => break,
            }
        }

        state.tick += 1;
        let tick = state.tick;
        state.entries.insert(
            key,
            Slot {
                vector,
                stored_at: Instant::now(),
                last_used: tick,
            },
        );
    }
}

impl std::fmt::Debug for EmbeddingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("EmbeddingCache")
            .field("size", &stats.size)
            .field("capacity", &stats.capacity)
            .field("hits", &stats.hits)
            .field("misses", &stats.misses)
            .finish()
    }
}
