//! External collaborator seams: embeddings, generations, vocabulary, tasks.
//!
//! Everything slow or remote sits behind one of these traits. The rest of the
//! crate only ever talks to `Arc<dyn ...>` handles, so tests swap in the mock
//! implementations and the live `reqwest` clients stay at the edge.

pub mod claude;
pub mod error;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use claude::ClaudeGenerativeProvider;
pub use error::{ProviderError, ProviderResult};
pub use openai::OpenAiEmbeddingProvider;

#[cfg(any(test, feature = "mock"))]
pub use mock::{
    MockEmbeddingProvider, MockGenerativeProvider, MockTaskStore, MockVocabularyStore,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A fixed-dimension embedding vector.
pub type EmbeddingVector = Vec<f32>;

/// One row of the vocabulary store, embedding parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabularyWord {
    /// The word itself (already normalized by the store).
    pub word: String,
    /// Embedding, present only when the page was requested with embeddings.
    pub embedding: Option<EmbeddingVector>,
    /// Corpus frequency rank, if the store tracks one.
    pub frequency_rank: Option<u32>,
}

/// One row as the store persists it, embedding still in wire form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredVocabularyRow {
    pub word: String,
    /// Raw stored payload: a JSON array or a pgvector-style string.
    pub embedding: Option<serde_json::Value>,
    pub frequency_rank: Option<u32>,
}

impl StoredVocabularyRow {
    /// Parses the stored payload into a pool row.
    ///
    /// A malformed payload is dropped with a warning; the word itself is
    /// kept, it just carries no embedding.
    pub fn into_word(self) -> VocabularyWord {
        let embedding = self
            .embedding
            .as_ref()
            .and_then(|raw| parse_stored_embedding(raw, &self.word));
        VocabularyWord {
            word: self.word,
            embedding,
            frequency_rank: self.frequency_rank,
        }
    }
}

/// Batch text → fixed-dimension float vectors.
///
/// Implementations must be idempotent for identical text and must return one
/// vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds every text in `texts`, preserving order and length.
    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<EmbeddingVector>>;
}

/// Short-text generation: guesses for a hidden target, or a bridging word list.
///
/// Both operations return plain lowercase single words, best-guess-first.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Guesses the hidden target word from `clue_words`.
    async fn guess(&self, clue_words: &[String], count: usize) -> ProviderResult<Vec<String>>;

    /// Generates `count` words that connect `anchor` and `target`.
    async fn build_bridge(
        &self,
        anchor: &str,
        target: &str,
        count: usize,
    ) -> ProviderResult<Vec<String>>;
}

/// Paginated read access to the persisted vocabulary.
#[async_trait]
pub trait VocabularyStore: Send + Sync {
    /// Returns one page of vocabulary rows, embeddings in wire form.
    ///
    /// The store is exhausted when a page comes back shorter than `limit`.
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        include_embeddings: bool,
    ) -> ProviderResult<Vec<StoredVocabularyRow>>;
}

/// External task persistence, consumed not owned: opaque id, settable named fields.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Creates a task record and returns its id.
    async fn create_task(&self, fields: serde_json::Value) -> ProviderResult<String>;

    /// Merges `fields` into the named task record.
    async fn update_task_fields(&self, id: &str, fields: serde_json::Value)
    -> ProviderResult<()>;
}

/// Parses a stored embedding payload into a float vector.
///
/// Stores persist vectors either as a JSON array or as a pgvector-style
/// `"[0.1,0.2,...]"` string. Returns `None` (after a warning) when the payload
/// cannot be parsed; callers filter such rows out of the batch instead of
/// aborting it.
pub fn parse_stored_embedding(raw: &serde_json::Value, word: &str) -> Option<EmbeddingVector> {
    let parsed = match raw {
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| item.as_f64().map(|v| v as f32))
            .collect::<Option<Vec<f32>>>(),
        serde_json::Value::String(text) => {
            let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
            if trimmed.is_empty() {
                None
            } else {
                trimmed
                    .split(',')
                    .map(|part| part.trim().parse::<f32>().ok())
                    .collect()
            }
        }
        _ => None,
    };

    if parsed.is_none() {
        warn!(word, "dropping row with malformed stored embedding");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json_array() {
        let parsed = parse_stored_embedding(&json!([0.1, 0.2, 0.3]), "coffee");
        assert_eq!(parsed, Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_parse_pgvector_string() {
        let parsed = parse_stored_embedding(&json!("[0.1, -0.2,0.3]"), "coffee");
        assert_eq!(parsed, Some(vec![0.1, -0.2, 0.3]));
    }

    #[test]
    fn test_malformed_payloads_return_none() {
        assert_eq!(parse_stored_embedding(&json!(true), "coffee"), None);
        assert_eq!(parse_stored_embedding(&json!([0.1, "x"]), "coffee"), None);
        assert_eq!(parse_stored_embedding(&json!("[]"), "coffee"), None);
        assert_eq!(parse_stored_embedding(&json!("0.1;0.2"), "coffee"), None);
    }

    #[test]
    fn test_into_word_drops_malformed_vector_keeps_word() {
        let row = StoredVocabularyRow {
            word: "coffee".to_string(),
            embedding: Some(json!("not a vector")),
            frequency_rank: Some(3),
        };
        let word = row.into_word();
        assert_eq!(word.word, "coffee");
        assert!(word.embedding.is_none());
        assert_eq!(word.frequency_rank, Some(3));
    }
}
