//! Lexbridge core: the semantic scoring and caching engine behind
//! word-association tasks.
//!
//! The crate computes how strongly a set of submitted words relates to a
//! semantic prompt (a single seed or an anchor/target pair), how dispersed
//! the words are from each other, and where those scores land against a
//! bootstrapped null distribution of random draws. Everything slow sits
//! behind provider traits; everything repeated sits behind a cache.
//!
//! # Public API Surface
//!
//! ## Providers
//! - [`EmbeddingProvider`], [`GenerativeProvider`], [`VocabularyStore`],
//!   [`TaskStore`] - the external collaborator seams
//! - [`OpenAiEmbeddingProvider`], [`ClaudeGenerativeProvider`] - live clients
//!
//! ## Caches
//! - [`EmbeddingCache`] - the single path to the embedding provider
//! - [`VocabularyPool`] - in-memory vocabulary for random sampling
//! - [`NoiseFloorCache`], [`StatsCache`] - cached derived computations
//!
//! ## Scoring
//! - [`score_submission`], [`bootstrap_null_distribution`],
//!   [`compare_submissions`] - the pure scoring entry points
//! - [`NullDistribution`] - sorted samples with percentile/z-score lookup
//!
//! ## Lexical search
//! - [`LexicalUnionFinder`] - jointly relevant vocabulary words
//! - [`NoiseFloorFinder`] - nearest-neighbor floors for any seed
//!
//! ## Precompute
//! - [`PrecomputeScheduler`] - background fan-out at task creation, with
//!   bounded-wait retrieval of [`PrecomputeSnapshot`]s
//!
//! ## Test/Mock Support
//! Mock providers are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod lexical;
pub mod precompute;
pub mod provider;
pub mod scoring;

pub use cache::{
    CacheStats, EmbeddingCache, FALLBACK_WORDS, NeighborScore, NoiseFloorCache, PoolStats,
    StatsCache, StatsCacheStats, VocabularyPool,
};
pub use config::{Config, ConfigError};
pub use lexical::{LexicalUnionFinder, NoiseFloorFinder, is_morphological_variant};
pub use precompute::{
    PrecomputeMode, PrecomputeScheduler, PrecomputeSnapshot, PrecomputeStatus, Recipient,
    SchedulerStats,
};
pub use provider::{
    ClaudeGenerativeProvider, EmbeddingProvider, EmbeddingVector, GenerativeProvider,
    OpenAiEmbeddingProvider, ProviderError, ProviderResult, StoredVocabularyRow, TaskStore,
    VocabularyStore, VocabularyWord, parse_stored_embedding,
};
#[cfg(any(test, feature = "mock"))]
pub use provider::{
    MockEmbeddingProvider, MockGenerativeProvider, MockTaskStore, MockVocabularyStore,
};
pub use scoring::{
    BootstrapDistributions, NullDistribution, Prompt, ScoreComparison, ScoringResult,
    bootstrap_null_distribution, bridge_similarity, compare_submissions, cosine_similarity,
    divergence_score, relevance_label, score_submission, spread_label, spread_score,
};
