//! In-memory vocabulary pool.
//!
//! Loads the word list from a [`VocabularyStore`] in pages at startup and
//! serves random draws without touching the backend again until the refresh
//! interval elapses. A failed load leaves the pool initialized but empty, so
//! callers fall back to a small built-in word list instead of erroring.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::{
    DEFAULT_VOCABULARY_MAX_WORDS, DEFAULT_VOCABULARY_PAGE_SIZE, VOCABULARY_REFRESH_INTERVAL_SECS,
};
use crate::provider::{EmbeddingVector, VocabularyStore};

/// Words served when the backing store is unavailable or empty.
pub const FALLBACK_WORDS: [&str; 45] = [
    "ocean", "mountain", "river", "forest", "desert", "island", "bridge", "castle", "garden",
    "window", "mirror", "candle", "ladder", "anchor", "compass", "lantern", "harbor", "meadow",
    "thunder", "shadow", "crystal", "marble", "copper", "silver", "velvet", "ribbon", "feather",
    "blossom", "ember", "horizon", "canyon", "glacier", "prairie", "orchard", "harvest", "voyage",
    "journey", "whisper", "melody", "rhythm", "puzzle", "riddle", "story", "memory", "dream",
];

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Words currently loaded.
    pub words: usize,
    /// Words that carry a stored embedding.
    pub with_embeddings: usize,
    /// Whether a load attempt has completed (even an empty one).
    pub initialized: bool,
}

struct PoolState {
    words: Vec<String>,
    embeddings: HashMap<String, EmbeddingVector>,
    index: HashSet<String>,
    initialized: bool,
    loaded_at: Option<Instant>,
}

/// Randomly sampled vocabulary backed by a [`VocabularyStore`].
pub struct VocabularyPool {
    state: Mutex<PoolState>,
    store: Arc<dyn VocabularyStore>,
    max_words: usize,
    page_size: usize,
    refresh_interval: Duration,
}

impl VocabularyPool {
    /// Creates a pool with default limits.
    pub fn new(store: Arc<dyn VocabularyStore>) -> Self {
        Self::with_limits(
            store,
            DEFAULT_VOCABULARY_MAX_WORDS,
            DEFAULT_VOCABULARY_PAGE_SIZE,
        )
    }

    /// Creates a pool sized from config.
    pub fn from_config(store: Arc<dyn VocabularyStore>, config: &Config) -> Self {
        Self::with_limits(store, config.vocabulary_max_words, config.vocabulary_page_size)
    }

    /// Creates a pool with explicit word cap and page size.
    pub fn with_limits(store: Arc<dyn VocabularyStore>, max_words: usize, page_size: usize) -> Self {
        Self {
            state: Mutex::new(PoolState {
                words: Vec::new(),
                embeddings: HashMap::new(),
                index: HashSet::new(),
                initialized: false,
                loaded_at: None,
            }),
            store,
            max_words,
            page_size,
            refresh_interval: Duration::from_secs(VOCABULARY_REFRESH_INTERVAL_SECS),
        }
    }

    /// Loads the vocabulary from the store, page by page, up to the word cap.
    ///
    /// A store failure at any point discards the pages already loaded and
    /// marks the pool initialized but empty, so callers see either the full
    /// vocabulary or the built-in fallback, never a partial load.
    pub async fn initialize(&self, include_embeddings: bool) {
        let mut words = Vec::new();
        let mut embeddings = HashMap::new();
        let mut offset = 0;

        loop {
            if words.len() >= self.max_words {
                break;
            }
            let limit = self.page_size.min(self.max_words - words.len());

            match self.store.list_page(offset, limit, include_embeddings).await {
                Ok(page) => {
                    let page_len = page.len();
                    for raw in page {
                        let row = raw.into_word();
                        let word = row.word.trim().to_lowercase();
                        if word.is_empty() {
                            continue;
                        }
                        if let Some(vector) = row.embedding {
                            embeddings.insert(word.clone(), vector);
                        }
                        words.push(word);
                    }
                    offset += page_len;
                    if page_len < limit {
                        break;
                    }
                }
                Err(err) => {
                    warn!(error = %err, discarded = words.len(), "vocabulary load failed, starting empty");
                    words.clear();
                    embeddings.clear();
                    break;
                }
            }
        }

        let index: HashSet<String> = words.iter().cloned().collect();
        info!(
            words = words.len(),
            with_embeddings = embeddings.len(),
            "vocabulary pool initialized"
        );

        let mut state = self.state.lock();
        state.words = words;
        state.embeddings = embeddings;
        state.index = index;
        state.initialized = true;
        state.loaded_at = Some(Instant::now());
    }

    /// One random word, from the fallback list when the pool is empty.
    pub fn get_random(&self) -> String {
        let state = self.state.lock();
        let mut rng = rand::rng();
        if state.words.is_empty() {
            return fallback_word(&mut rng);
        }
        state.words[rng.random_range(0..state.words.len())].clone()
    }

    /// `n` random words.
    ///
    /// Without duplicates the draw is capped at the pool size; with
    /// duplicates it always returns exactly `n` words.
    pub fn get_random_batch(&self, n: usize, allow_duplicates: bool) -> Vec<String> {
        let state = self.state.lock();
        let mut rng = rand::rng();

        if state.words.is_empty() {
            return (0..n).map(|_| fallback_word(&mut rng)).collect();
        }

        if allow_duplicates {
            (0..n)
                .map(|_| state.words[rng.random_range(0..state.words.len())].clone())
                .collect()
        } else {
            let count = n.min(state.words.len());
            rand::seq::index::sample(&mut rng, state.words.len(), count)
                .into_iter()
                .map(|i| state.words[i].clone())
                .collect()
        }
    }

    /// `n` random words that carry stored embeddings, paired with them.
    pub fn get_random_with_embeddings(&self, n: usize) -> Vec<(String, EmbeddingVector)> {
        let state = self.state.lock();
        let mut rng = rand::rng();

        let candidates: Vec<&String> = state.embeddings.keys().collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let count = n.min(candidates.len());
        rand::seq::index::sample(&mut rng, candidates.len(), count)
            .into_iter()
            .map(|i| {
                let word = candidates[i];
                (word.clone(), state.embeddings[word].clone())
            })
            .collect()
    }

    /// Every loaded word that carries an embedding, paired with it.
    ///
    /// Clones the whole map; intended for full-vocabulary scans (union
    /// search, noise floors), not per-request sampling.
    pub fn embedded_words(&self) -> Vec<(String, EmbeddingVector)> {
        let state = self.state.lock();
        state
            .embeddings
            .iter()
            .map(|(word, vector)| (word.clone(), vector.clone()))
            .collect()
    }

    /// Whether the normalized form of `word` is in the pool.
    pub fn contains(&self, word: &str) -> bool {
        let normalized = word.trim().to_lowercase();
        self.state.lock().index.contains(&normalized)
    }

    /// Stored embedding for `word`, if the pool loaded one.
    pub fn embedding_of(&self, word: &str) -> Option<EmbeddingVector> {
        let normalized = word.trim().to_lowercase();
        self.state.lock().embeddings.get(&normalized).cloned()
    }

    /// True before the first load and once the refresh interval has elapsed.
    pub fn needs_refresh(&self) -> bool {
        let state = self.state.lock();
        match (state.initialized, state.loaded_at) {
            (true, Some(loaded_at)) => loaded_at.elapsed() > self.refresh_interval,
            _ => true,
        }
    }

    /// Current pool occupancy.
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            words: state.words.len(),
            with_embeddings: state.embeddings.len(),
            initialized: state.initialized,
        }
    }
}

impl std::fmt::Debug for VocabularyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("VocabularyPool")
            .field("words", &stats.words)
            .field("with_embeddings", &stats.with_embeddings)
            .field("initialized", &stats.initialized)
            .finish()
    }
}

fn fallback_word<R: Rng>(rng: &mut R) -> String {
    FALLBACK_WORDS[rng.random_range(0..FALLBACK_WORDS.len())].to_string()
}
