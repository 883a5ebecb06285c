use crate::constants::{PERCENTILE_CEIL, PERCENTILE_FLOOR};
use crate::provider::EmbeddingVector;

/// The semantic prompt a submission is scored against.
#[derive(Debug, Clone)]
pub enum Prompt {
    /// A single seed concept; submitted words radiate outward from it.
    Seeded(EmbeddingVector),
    /// An anchor/target pair; submitted words must bridge both.
    Bridged {
        /// First endpoint.
        anchor: EmbeddingVector,
        /// Second endpoint.
        target: EmbeddingVector,
    },
}

/// Scores for one submission. Pure value type, never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    /// Overall relevance in `[0, 1]` (mean of per-word relevance).
    pub relevance: f32,
    /// Per-word relevance, in submission order.
    pub relevance_by_word: Vec<f32>,
    /// Mean pairwise cosine distance among the submitted words only,
    /// scaled 0-100. The primary dispersion signal.
    pub spread: f32,
    /// Legacy prompt-inclusive pairwise distance, scaled 0-100. Retained for
    /// numeric parity with historical scores; prefer [`spread`](Self::spread).
    pub divergence: f32,
    /// Whether relevance clears the noise threshold. When `false`, the
    /// dispersion metrics are uninterpretable and must not be surfaced.
    pub valid: bool,
}

impl ScoringResult {
    /// The all-zero result for an empty submission.
    pub fn empty() -> Self {
        Self {
            relevance: 0.0,
            relevance_by_word: Vec::new(),
            spread: 0.0,
            divergence: 0.0,
            valid: false,
        }
    }
}

/// Relevance/spread deltas between a participant and a baseline submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreComparison {
    /// Participant relevance minus baseline relevance.
    pub relevance_delta: f32,
    /// Participant spread minus baseline spread.
    pub spread_delta: f32,
    /// `true` only when both submissions are valid and the participant's
    /// spread exceeds the baseline's.
    pub more_creative: bool,
}

/// Sorted empirical distribution of scores from random, non-deliberate draws.
///
/// Immutable after construction; used only for percentile lookup and
/// z-scoring.
#[derive(Debug, Clone)]
pub struct NullDistribution {
    samples: Vec<f32>,
    mean: f32,
    std_dev: f32,
}

impl NullDistribution {
    /// Builds a distribution from raw samples (sorted internally).
    pub fn from_samples(mut samples: Vec<f32>) -> Self {
        samples.sort_by(|a, b| a.total_cmp(b));

        let n = samples.len() as f32;
        let (mean, std_dev) = if samples.is_empty() {
            (0.0, 0.0)
        } else {
            let mean = samples.iter().sum::<f32>() / n;
            let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
            (mean, variance.sqrt())
        };

        Self {
            samples,
            mean,
            std_dev,
        }
    }

    /// Percentile of `score` within the distribution: the fraction of samples
    /// strictly below it, scaled to 0-100 and clamped so absolute 0/100 are
    /// never reported. Empty distributions yield the neutral 50th percentile.
    pub fn percentile_of(&self, score: f32) -> f32 {
        if self.samples.is_empty() {
            return 50.0;
        }

        let below = self.samples.partition_point(|s| *s < score);
        let percentile = (below as f32 / self.samples.len() as f32) * 100.0;
        percentile.clamp(PERCENTILE_FLOOR, PERCENTILE_CEIL)
    }

    /// Standard deviations of `score` from the null mean; `0` when the
    /// distribution is degenerate.
    pub fn z_score(&self, score: f32) -> f32 {
        if self.std_dev > 0.0 {
            (score - self.mean) / self.std_dev
        } else {
            0.0
        }
    }

    /// Mean of the samples.
    pub fn mean(&self) -> f32 {
        self.mean
    }

    /// Standard deviation of the samples.
    pub fn std_dev(&self) -> f32 {
        self.std_dev
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples were collected.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The sorted samples.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }
}

/// Paired relevance/spread null distributions from one bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapDistributions {
    /// Null distribution of relevance scores.
    pub relevance: NullDistribution,
    /// Null distribution of spread scores.
    pub spread: NullDistribution,
    /// Submission size the draws simulated.
    pub n_clues: usize,
}
