//! Joint-relevance search over the vocabulary.
//!
//! Finds the words a purely lexical strategy would pick to bridge two anchor
//! concepts. Serves as the non-generative baseline a human submission is
//! compared against.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{EmbeddingCache, VocabularyPool};
use crate::lexical::variants::is_morphological_variant;
use crate::provider::ProviderResult;
use crate::scoring::cosine_similarity;

/// Searches the vocabulary for words jointly relevant to two anchors.
pub struct LexicalUnionFinder {
    embeddings: Arc<EmbeddingCache>,
    pool: Arc<VocabularyPool>,
}

impl LexicalUnionFinder {
    pub fn new(embeddings: Arc<EmbeddingCache>, pool: Arc<VocabularyPool>) -> Self {
        Self { embeddings, pool }
    }

    /// Returns up to `count` vocabulary words jointly relevant to both
    /// `anchor` and `target`, best first.
    ///
    /// Each candidate is scored `sim(word, anchor) + sim(word, target)`,
    /// which favors words close to both concepts over words merely close to
    /// their midpoint. Candidates equal to (or morphological variants of)
    /// the anchor, the target, or any already selected word are skipped.
    #[instrument(skip(self), fields(anchor = %anchor, target = %target))]
    pub async fn find_jointly_relevant(
        &self,
        anchor: &str,
        target: &str,
        count: usize,
    ) -> ProviderResult<Vec<String>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pair = vec![anchor.to_string(), target.to_string()];
        let pair_embeddings = self.embeddings.get_batch(&pair).await?;
        let anchor_embedding = &pair_embeddings[0];
        let target_embedding = &pair_embeddings[1];

        let candidates = self.pool.embedded_words();
        let mut scored: Vec<(String, f32)> = candidates
            .into_iter()
            .filter(|(word, _)| {
                !is_morphological_variant(word, anchor) && !is_morphological_variant(word, target)
            })
            .map(|(word, vector)| {
                let joint = cosine_similarity(&vector, anchor_embedding)
                    + cosine_similarity(&vector, target_embedding);
                (word, joint)
            })
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut selected: Vec<String> = Vec::with_capacity(count);
        for (word, _) in scored {
            if selected
                .iter()
                .any(|chosen| is_morphological_variant(&word, chosen))
            {
                continue;
            }
            selected.push(word);
            if selected.len() == count {
                break;
            }
        }

        debug!(found = selected.len(), requested = count, "lexical union");
        Ok(selected)
    }
}
