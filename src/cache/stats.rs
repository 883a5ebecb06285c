//! Pre-built null distributions for instant percentile lookup.
//!
//! Bootstrapping a null distribution at submission time costs hundreds of
//! vector operations. This cache builds one distribution per clue count at
//! startup from random vocabulary draws, so a percentile becomes a binary
//! search into a sorted array.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use tracing::{info, warn};

use crate::cache::VocabularyPool;
use crate::config::Config;
use crate::constants::{
    DEFAULT_BOOTSTRAP_SAMPLES, STATS_CLUE_COUNTS, STATS_MIN_VOCABULARY, STATS_REFRESH_INTERVAL_SECS,
    STATS_VOCABULARY_DRAW,
};
use crate::provider::EmbeddingVector;
use crate::scoring::{NullDistribution, cosine_similarity};

/// Snapshot of which distributions are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsCacheStats {
    pub initialized: bool,
    /// Clue counts with a pre-built distribution, ascending.
    pub distributions_cached: Vec<usize>,
    pub samples_per_distribution: usize,
    pub needs_refresh: bool,
}

struct StatsState {
    distributions: HashMap<usize, NullDistribution>,
    initialized: bool,
    last_refresh: Option<Instant>,
}

/// Null distributions keyed by clue count, built once per refresh cycle.
pub struct StatsCache {
    state: Mutex<StatsState>,
    samples_per_distribution: usize,
    refresh_interval: Duration,
}

impl StatsCache {
    /// Creates an empty cache; call [`initialize`](Self::initialize) to build.
    pub fn new() -> Self {
        Self::with_samples(DEFAULT_BOOTSTRAP_SAMPLES)
    }

    /// Creates a cache with the bootstrap sample count from config.
    pub fn from_config(config: &Config) -> Self {
        Self::with_samples(config.bootstrap_samples)
    }

    /// Creates a cache with an explicit bootstrap sample count.
    pub fn with_samples(samples_per_distribution: usize) -> Self {
        Self {
            state: Mutex::new(StatsState {
                distributions: HashMap::new(),
                initialized: false,
                last_refresh: None,
            }),
            samples_per_distribution,
            refresh_interval: Duration::from_secs(STATS_REFRESH_INTERVAL_SECS),
        }
    }

    /// Builds one relevance null distribution per clue count from random
    /// vocabulary draws.
    ///
    /// Skips the build (but still marks the cache initialized) when the pool
    /// holds too few embedded words to sample meaningfully; percentile
    /// lookups then fall back to 50.0.
    pub fn initialize(&self, pool: &VocabularyPool) {
        let started = Instant::now();
        let samples = pool.get_random_with_embeddings(STATS_VOCABULARY_DRAW);

        if samples.len() < STATS_MIN_VOCABULARY {
            warn!(
                available = samples.len(),
                required = STATS_MIN_VOCABULARY,
                "too few vocabulary embeddings, skipping null distribution build"
            );
            let mut state = self.state.lock();
            state.initialized = true;
            state.last_refresh = Some(Instant::now());
            return;
        }

        let embeddings: Vec<EmbeddingVector> =
            samples.into_iter().map(|(_, vector)| vector).collect();
        let mut rng = rand::rng();

        let mut distributions = HashMap::new();
        for n_clues in STATS_CLUE_COUNTS {
            distributions.insert(
                n_clues,
                build_distribution(&embeddings, n_clues, self.samples_per_distribution, &mut rng),
            );
        }

        info!(
            distributions = distributions.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "null distributions built"
        );

        let mut state = self.state.lock();
        state.distributions = distributions;
        state.initialized = true;
        state.last_refresh = Some(Instant::now());
    }

    /// Percentile of a relevance score against the pre-built distribution
    /// for `num_clues`, or 50.0 if that clue count was never built.
    pub fn relevance_percentile(&self, relevance: f32, num_clues: usize) -> f32 {
        let state = self.state.lock();
        match state.distributions.get(&num_clues) {
            Some(distribution) => distribution.percentile_of(relevance),
            None => 50.0,
        }
    }

    /// Rough percentile of a spread score on the 0-100 DAT scale.
    ///
    /// Piecewise mapping anchored on published DAT norms, where typical
    /// scores land around 75-80. Spread distributions are not bootstrapped
    /// per clue count the way relevance is.
    pub fn spread_percentile(&self, spread: f32) -> f32 {
        if spread < 50.0 {
            spread * 0.5
        } else if spread < 70.0 {
            25.0 + (spread - 50.0) * 1.25
        } else if spread < 85.0 {
            50.0 + (spread - 70.0) * 2.0
        } else {
            (80.0 + (spread - 85.0)).min(99.9)
        }
    }

    /// Whether the cache has ever been initialized.
    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    /// True before the first build and once the refresh interval elapses.
    pub fn needs_refresh(&self) -> bool {
        let state = self.state.lock();
        match state.last_refresh {
            Some(at) => at.elapsed() > self.refresh_interval,
            None => true,
        }
    }

    /// Current build state.
    pub fn stats(&self) -> StatsCacheStats {
        let state = self.state.lock();
        let mut cached: Vec<usize> = state.distributions.keys().copied().collect();
        cached.sort_unstable();
        let needs_refresh = match state.last_refresh {
            Some(at) => at.elapsed() > self.refresh_interval,
            None => true,
        };
        StatsCacheStats {
            initialized: state.initialized,
            distributions_cached: cached,
            samples_per_distribution: self.samples_per_distribution,
            needs_refresh,
        }
    }

    /// Drops all distributions and resets to uninitialized.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.distributions.clear();
        state.initialized = false;
        state.last_refresh = None;
    }
}

impl Default for StatsCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StatsCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("StatsCache")
            .field("initialized", &stats.initialized)
            .field("distributions_cached", &stats.distributions_cached)
            .finish()
    }
}

/// Simulates `num_samples` random submissions of `num_clues` words against a
/// random anchor/target pair and collects their relevance scores.
fn build_distribution<R: Rng>(
    embeddings: &[EmbeddingVector],
    num_clues: usize,
    num_samples: usize,
    rng: &mut R,
) -> NullDistribution {
    let draw = 2 + num_clues;
    if embeddings.len() < draw {
        return NullDistribution::from_samples(Vec::new());
    }

    let mut scores = Vec::with_capacity(num_samples);
    for _ in 0..num_samples {
        let indices = rand::seq::index::sample(rng, embeddings.len(), draw);
        let anchor = &embeddings[indices.index(0)];
        let target = &embeddings[indices.index(1)];

        let mut anchor_sum = 0.0f32;
        let mut target_sum = 0.0f32;
        for slot in 2..draw {
            let clue = &embeddings[indices.index(slot)];
            anchor_sum += cosine_similarity(clue, anchor);
            target_sum += cosine_similarity(clue, target);
        }
        let n = num_clues as f32;
        scores.push((anchor_sum / n + target_sum / n) / 2.0);
    }

    NullDistribution::from_samples(scores)
}
