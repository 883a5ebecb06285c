//! Statistical scoring engine: pure vector math, no I/O.

pub mod engine;
pub mod types;


pub use engine::{
    bootstrap_null_distribution, bridge_similarity, compare_submissions, cosine_similarity,
    divergence_score, relevance_label, score_submission, spread_label, spread_score,
};
pub use types::{BootstrapDistributions, NullDistribution, Prompt, ScoreComparison, ScoringResult};
