//! Pure scoring math: relevance, spread, bootstrap nulls, comparison.
//!
//! Both instruments use exactly two orthogonal metrics:
//! - **relevance**: are the submitted words connected to the prompt?
//! - **spread**: how dispersed are they from each other? (DAT convention,
//!   Olson et al. 2021, scaled 0-100)
//!
//! High relevance + high spread = creative but on-topic. Low relevance means
//! the spread is noise, which is what [`ScoringResult::valid`] gates.
//!
//! Nothing here does I/O or touches a cache; every function takes vectors.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index::sample;

use crate::constants::RELEVANCE_THRESHOLD;
use crate::provider::EmbeddingVector;

use super::types::{BootstrapDistributions, NullDistribution, Prompt, ScoreComparison, ScoringResult};

/// Cosine similarity in `[-1, 1]`; `0` when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Mean pairwise cosine distance across all unordered pairs, scaled 0-100.
/// Fewer than two vectors yields `0`.
fn mean_pairwise_distance(vectors: &[&[f32]]) -> f32 {
    if vectors.len() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    let mut pairs = 0u32;
    for i in 0..vectors.len() {
        for j in (i + 1)..vectors.len() {
            total += 1.0 - cosine_similarity(vectors[i], vectors[j]);
            pairs += 1;
        }
    }
    (total / pairs as f32) * 100.0
}

/// Spread: mean pairwise cosine distance among the submitted words only
/// (prompt excluded), scaled 0-100.
///
/// Excluding the prompt isolates "how dispersed is this submission" from
/// "how hard was this prompt", which the legacy [`divergence_score`]
/// conflates.
pub fn spread_score(word_embeddings: &[EmbeddingVector]) -> f32 {
    let refs: Vec<&[f32]> = word_embeddings.iter().map(Vec::as_slice).collect();
    mean_pairwise_distance(&refs)
}

/// Legacy DAT-style divergence: pairwise distance over prompt words and
/// submitted words together, scaled 0-100.
pub fn divergence_score(
    word_embeddings: &[EmbeddingVector],
    prompt_embeddings: &[EmbeddingVector],
) -> f32 {
    let refs: Vec<&[f32]> = prompt_embeddings
        .iter()
        .chain(word_embeddings)
        .map(Vec::as_slice)
        .collect();
    mean_pairwise_distance(&refs)
}

/// Scores a submission against a prompt.
///
/// Per-word relevance is similarity to the seed in seeded mode, and
/// `min(sim(word, anchor), sim(word, target))` in bridged mode. The minimum,
/// not the mean, so a word close to only one endpoint is penalized.
pub fn score_submission(prompt: &Prompt, word_embeddings: &[EmbeddingVector]) -> ScoringResult {
    if word_embeddings.is_empty() {
        return ScoringResult::empty();
    }

    let relevance_by_word: Vec<f32> = match prompt {
        Prompt::Seeded(seed) => word_embeddings
            .iter()
            .map(|word| cosine_similarity(word, seed))
            .collect(),
        Prompt::Bridged { anchor, target } => word_embeddings
            .iter()
            .map(|word| cosine_similarity(word, anchor).min(cosine_similarity(word, target)))
            .collect(),
    };

    let relevance = relevance_by_word.iter().sum::<f32>() / relevance_by_word.len() as f32;
    let spread = spread_score(word_embeddings);
    let divergence = match prompt {
        Prompt::Seeded(seed) => {
            divergence_score(word_embeddings, std::slice::from_ref(seed))
        }
        // The later methodology revision dropped prompt words from the
        // bridged pairwise set entirely; divergence aliases spread there.
        Prompt::Bridged { .. } => spread,
    };

    ScoringResult {
        relevance,
        relevance_by_word,
        spread,
        divergence,
        valid: relevance >= RELEVANCE_THRESHOLD,
    }
}

/// Builds relevance/spread null distributions by repeatedly drawing `n_clues`
/// random vocabulary vectors without replacement and scoring each draw with
/// the same formulas as real submissions.
///
/// Deterministic for a given `seed`. Empty vocabulary or a zero clue count
/// produces empty distributions (whose percentile lookups neutral-default).
pub fn bootstrap_null_distribution(
    prompt: &Prompt,
    vocabulary: &[EmbeddingVector],
    n_clues: usize,
    n_samples: usize,
    seed: u64,
) -> BootstrapDistributions {
    if vocabulary.is_empty() || n_clues == 0 {
        return BootstrapDistributions {
            relevance: NullDistribution::from_samples(Vec::new()),
            spread: NullDistribution::from_samples(Vec::new()),
            n_clues,
        };
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let draw_size = n_clues.min(vocabulary.len());

    let mut relevance_samples = Vec::with_capacity(n_samples);
    let mut spread_samples = Vec::with_capacity(n_samples);

    for _ in 0..n_samples {
        let draw: Vec<EmbeddingVector> = sample(&mut rng, vocabulary.len(), draw_size)
            .iter()
            .map(|i| vocabulary[i].clone())
            .collect();

        let scores = score_submission(prompt, &draw);
        relevance_samples.push(scores.relevance);
        spread_samples.push(scores.spread);
    }

    BootstrapDistributions {
        relevance: NullDistribution::from_samples(relevance_samples),
        spread: NullDistribution::from_samples(spread_samples),
        n_clues,
    }
}

/// Compares a participant submission against a baseline (e.g. the generative
/// provider's bridge).
pub fn compare_submissions(
    participant: &ScoringResult,
    baseline: &ScoringResult,
) -> ScoreComparison {
    let relevance_delta = participant.relevance - baseline.relevance;
    let spread_delta = participant.spread - baseline.spread;

    ScoreComparison {
        relevance_delta,
        spread_delta,
        more_creative: participant.valid && baseline.valid && spread_delta > 0.0,
    }
}

/// Centroid-to-centroid similarity of two word sets, mapped to `[0, 1]`.
pub fn bridge_similarity(a: &[EmbeddingVector], b: &[EmbeddingVector]) -> f32 {
    let (Some(ca), Some(cb)) = (centroid(a), centroid(b)) else {
        return 0.0;
    };
    (cosine_similarity(&ca, &cb) + 1.0) / 2.0
}

fn centroid(vectors: &[EmbeddingVector]) -> Option<EmbeddingVector> {
    let first = vectors.first()?;
    let mut sum = vec![0.0f32; first.len()];
    for vector in vectors {
        for (acc, v) in sum.iter_mut().zip(vector) {
            *acc += v;
        }
    }
    let n = vectors.len() as f32;
    for acc in &mut sum {
        *acc /= n;
    }
    Some(sum)
}

/// Human-readable band for a relevance score.
pub fn relevance_label(score: f32) -> &'static str {
    if score < RELEVANCE_THRESHOLD {
        "Noise"
    } else if score < 0.30 {
        "Weak"
    } else if score < 0.45 {
        "Moderate"
    } else {
        "Strong"
    }
}

/// Human-readable band for a spread score (DAT norms).
pub fn spread_label(score: f32) -> &'static str {
    if score < 50.0 {
        "Low"
    } else if score < 75.0 {
        "Below Average"
    } else if score < 85.0 {
        "Average"
    } else if score < 95.0 {
        "Above Average"
    } else {
        "High"
    }
}
