//! Cross-cutting, shared constants.
//!
//! Most of these are defaults that [`crate::config::Config`] can override at
//! runtime; the scoring thresholds are fixed calibration constants and must
//! not be made configurable without re-validating historical scores.

/// Embedding dimension of `text-embedding-3-small` (the default provider model).
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

/// Minimum relevance for a submission to be interpretable at all.
///
/// Below this the submitted words are statistically indistinguishable from
/// noise and the spread metric carries no signal; downstream consumers must
/// gate on [`crate::scoring::ScoringResult::valid`].
pub const RELEVANCE_THRESHOLD: f32 = 0.15;

/// Cosine similarity above which two words are treated as the same word.
pub const FUZZY_EXACT_MATCH_THRESHOLD: f32 = 0.99;

/// Max entries in the embedding cache (~6 KB per 1536-dim vector, ~60 MB).
pub const DEFAULT_EMBEDDING_CACHE_CAPACITY: usize = 10_000;

/// TTL for embedding cache entries.
pub const DEFAULT_EMBEDDING_CACHE_TTL_SECS: u64 = 3600;

/// Max cached noise floors.
pub const DEFAULT_NOISE_FLOOR_CAPACITY: u64 = 1_000;

/// TTL for noise-floor cache entries.
pub const DEFAULT_NOISE_FLOOR_TTL_SECS: u64 = 3600;

/// Default number of nearest neighbors in a noise floor.
pub const DEFAULT_NOISE_FLOOR_K: usize = 20;

/// Max words loaded into the in-memory vocabulary pool.
pub const DEFAULT_VOCABULARY_MAX_WORDS: usize = 50_000;

/// Page size when paginating through the vocabulary store.
pub const DEFAULT_VOCABULARY_PAGE_SIZE: usize = 10_000;

/// Advisory staleness interval for the vocabulary pool.
pub const VOCABULARY_REFRESH_INTERVAL_SECS: u64 = 3600;

/// Bootstrap samples drawn per pre-built null distribution.
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 200;

/// Vocabulary draw size used to seed the stats cache distributions.
pub const STATS_VOCABULARY_DRAW: usize = 500;

/// Minimum embedded vocabulary required before pre-building distributions.
pub const STATS_MIN_VOCABULARY: usize = 100;

/// Submission sizes the stats cache pre-builds distributions for.
pub const STATS_CLUE_COUNTS: std::ops::RangeInclusive<usize> = 1..=7;

/// Advisory staleness interval for pre-built null distributions.
pub const STATS_REFRESH_INTERVAL_SECS: u64 = 1800;

/// How long completed precompute tasks are retained.
pub const DEFAULT_PRECOMPUTE_TTL_SECS: u64 = 1800;

/// Hard cap on retained precompute tasks (oldest-started evicted first).
pub const DEFAULT_PRECOMPUTE_CAPACITY: usize = 1_000;

/// Default bounded wait when consumers retrieve precomputed results.
pub const DEFAULT_PRECOMPUTE_WAIT_SECS: u64 = 5;

/// Null samples drawn per task during eager precomputation.
pub const PRECOMPUTE_NULL_SAMPLES: usize = 100;

/// Clue count simulated by the per-task null samples.
pub const PRECOMPUTE_NULL_CLUES: usize = 5;

/// Vocabulary draw size for per-task null sampling.
pub const PRECOMPUTE_VOCABULARY_DRAW: usize = 200;

/// Minimum embedded vocabulary required for per-task null sampling.
pub const PRECOMPUTE_MIN_VOCABULARY: usize = 50;

/// Percentiles are clamped into this range so absolute 0/100 are never reported.
pub const PERCENTILE_FLOOR: f32 = 0.1;
/// Upper percentile clamp, paired with [`PERCENTILE_FLOOR`].
pub const PERCENTILE_CEIL: f32 = 99.9;
