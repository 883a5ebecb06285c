//! Noise floor computation: the most predictable words around a seed.
//!
//! Works for any seed text, not just vocabulary words. The seed is embedded
//! on demand (with optional sense context for polysemous words), then the k
//! nearest vocabulary neighbors are returned. When the pool carries no
//! embeddings at all, a generative provider supplies candidate words instead.
//! Finished floors are kept in the [`NoiseFloorCache`].

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::cache::{EmbeddingCache, NeighborScore, NoiseFloorCache, VocabularyPool};
use crate::constants::{DEFAULT_NOISE_FLOOR_K, FUZZY_EXACT_MATCH_THRESHOLD};
use crate::lexical::variants::is_morphological_variant;
use crate::provider::{GenerativeProvider, ProviderResult};
use crate::scoring::cosine_similarity;

/// Computes and caches per-seed nearest-neighbor floors.
pub struct NoiseFloorFinder {
    cache: Arc<NoiseFloorCache>,
    embeddings: Arc<EmbeddingCache>,
    pool: Arc<VocabularyPool>,
    generative: Arc<dyn GenerativeProvider>,
}

impl NoiseFloorFinder {
    pub fn new(
        cache: Arc<NoiseFloorCache>,
        embeddings: Arc<EmbeddingCache>,
        pool: Arc<VocabularyPool>,
        generative: Arc<dyn GenerativeProvider>,
    ) -> Self {
        Self {
            cache,
            embeddings,
            pool,
            generative,
        }
    }

    /// The default-size floor: [`DEFAULT_NOISE_FLOOR_K`] nearest neighbors.
    pub async fn default_floor(
        &self,
        seed: &str,
        context: &[String],
    ) -> ProviderResult<Arc<Vec<NeighborScore>>> {
        self.nearest_neighbors(seed, context, DEFAULT_NOISE_FLOOR_K).await
    }

    /// The `k` vocabulary words nearest to `seed`, most similar first.
    ///
    /// A cache hit never recomputes. The seed itself is excluded from the
    /// floor, both by the morphological variant rules and by the fuzzy
    /// exact-match threshold on similarity.
    #[instrument(skip(self), fields(seed = %seed, k))]
    pub async fn nearest_neighbors(
        &self,
        seed: &str,
        context: &[String],
        k: usize,
    ) -> ProviderResult<Arc<Vec<NeighborScore>>> {
        if let Some(cached) = self.cache.get(seed, context, k) {
            return Ok(cached);
        }

        let seed_clean = seed.trim().to_lowercase();
        let seed_embedding = self.embeddings.get_contextual(&seed_clean, context).await?;

        let candidates = self.pool.embedded_words();
        let neighbors = if candidates.is_empty() {
            warn!("vocabulary pool has no embeddings, using generative fallback");
            self.generative_floor(&seed_clean, &seed_embedding, k).await?
        } else {
            let mut scored: Vec<NeighborScore> = candidates
                .into_iter()
                .filter(|(word, _)| !is_morphological_variant(word, &seed_clean))
                .map(|(word, vector)| NeighborScore {
                    similarity: cosine_similarity(&vector, &seed_embedding),
                    word,
                })
                .filter(|scored| scored.similarity < FUZZY_EXACT_MATCH_THRESHOLD)
                .collect();
            scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            scored.truncate(k);
            scored
        };

        debug!(neighbors = neighbors.len(), "noise floor computed");
        Ok(self.cache.insert(seed, context, k, neighbors))
    }

    async fn generative_floor(
        &self,
        seed: &str,
        seed_embedding: &[f32],
        k: usize,
    ) -> ProviderResult<Vec<NeighborScore>> {
        let prompt = vec![seed.to_string()];
        let words = self.generative.guess(&prompt, k).await?;

        let texts: Vec<String> = words
            .iter()
            .filter(|word| !is_morphological_variant(word, seed))
            .cloned()
            .collect();
        let vectors = self.embeddings.get_batch(&texts).await?;

        let mut scored: Vec<NeighborScore> = texts
            .into_iter()
            .zip(vectors)
            .map(|(word, vector)| NeighborScore {
                similarity: cosine_similarity(&vector, seed_embedding),
                word,
            })
            .collect();
        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        scored.truncate(k);
        Ok(scored)
    }
}
