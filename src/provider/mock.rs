//! Mock providers for tests: deterministic embeddings, scripted generations,
//! in-memory vocabulary and task stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::error::{ProviderError, ProviderResult};
use super::{
    EmbeddingProvider, EmbeddingVector, GenerativeProvider, StoredVocabularyRow, TaskStore,
    VocabularyStore, VocabularyWord,
};

/// Deterministic embedding provider: each normalized text maps to a stable
/// unit vector derived from an FNV-1a hash of the text, so "same text, same
/// vector" holds across calls without any network dependency.
pub struct MockEmbeddingProvider {
    dim: usize,
    overrides: Mutex<HashMap<String, EmbeddingVector>>,
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
    fail: AtomicBool,
}

impl MockEmbeddingProvider {
    /// Creates a provider emitting vectors of `dim` floats.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            overrides: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Pins an exact vector for a text (normalized), overriding the hash.
    ///
    /// Lets tests control geometry: e.g. make "bean" genuinely close to
    /// "coffee" instead of hash-random.
    pub fn with_vector(self, text: &str, vector: EmbeddingVector) -> Self {
        self.overrides
            .lock()
            .insert(text.trim().to_lowercase(), vector);
        self
    }

    /// Number of `embed_batch` calls that reached the provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Total texts embedded across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::Relaxed)
    }

    /// Makes every subsequent call fail as unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Relaxed);
    }

    /// The deterministic vector for `text` (what `embed_batch` would return).
    pub fn vector_for(&self, text: &str) -> EmbeddingVector {
        let key = text.trim().to_lowercase();
        if let Some(pinned) = self.overrides.lock().get(&key) {
            return pinned.clone();
        }
        hash_unit_vector(&key, self.dim)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_batch(&self, texts: &[String]) -> ProviderResult<Vec<EmbeddingVector>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(ProviderError::Unavailable {
                reason: "mock provider set to fail".to_string(),
            });
        }

        self.calls.fetch_add(1, Ordering::Relaxed);
        self.texts_embedded.fetch_add(texts.len(), Ordering::Relaxed);

        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

/// FNV-1a over the text seeds a `StdRng`; the vector is then unit-normalized.
fn hash_unit_vector(text: &str, dim: usize) -> EmbeddingVector {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = FNV_OFFSET;
    for byte in text.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    let mut rng = StdRng::seed_from_u64(hash);
    let mut vector: Vec<f32> = (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect();

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Generative provider returning scripted word lists.
#[derive(Default)]
pub struct MockGenerativeProvider {
    guesses: Vec<String>,
    bridge_words: Vec<String>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MockGenerativeProvider {
    /// Creates a provider with fixed guess and bridge outputs.
    pub fn new(guesses: Vec<&str>, bridge_words: Vec<&str>) -> Self {
        Self {
            guesses: guesses.into_iter().map(String::from).collect(),
            bridge_words: bridge_words.into_iter().map(String::from).collect(),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent call fail as unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Relaxed);
    }

    /// Number of calls that reached the provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn take(&self, source: &[String], count: usize) -> ProviderResult<Vec<String>> {
        if self.fail.load(Ordering::Relaxed) {
            return Err(ProviderError::Unavailable {
                reason: "mock provider set to fail".to_string(),
            });
        }
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(source.iter().take(count).cloned().collect())
    }
}

#[async_trait]
impl GenerativeProvider for MockGenerativeProvider {
    async fn guess(&self, _clue_words: &[String], count: usize) -> ProviderResult<Vec<String>> {
        self.take(&self.guesses, count)
    }

    async fn build_bridge(
        &self,
        _anchor: &str,
        _target: &str,
        count: usize,
    ) -> ProviderResult<Vec<String>> {
        self.take(&self.bridge_words, count)
    }
}

/// In-memory vocabulary store with real pagination semantics.
#[derive(Clone)]
pub struct MockVocabularyStore {
    rows: Arc<Vec<StoredVocabularyRow>>,
    fail: Arc<AtomicBool>,
    fail_after: Arc<AtomicUsize>,
    pages_served: Arc<AtomicUsize>,
}

impl MockVocabularyStore {
    /// Creates a store over parsed rows, persisting embeddings as JSON arrays.
    pub fn new(rows: Vec<VocabularyWord>) -> Self {
        let raw = rows
            .into_iter()
            .map(|row| StoredVocabularyRow {
                word: row.word,
                embedding: row.embedding.map(|vector| serde_json::json!(vector)),
                frequency_rank: row.frequency_rank,
            })
            .collect();
        Self::with_raw_rows(raw)
    }

    /// Creates a store over rows in wire form, payloads taken as given.
    pub fn with_raw_rows(rows: Vec<StoredVocabularyRow>) -> Self {
        Self {
            rows: Arc::new(rows),
            fail: Arc::new(AtomicBool::new(false)),
            fail_after: Arc::new(AtomicUsize::new(usize::MAX)),
            pages_served: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a store of `count` synthetic words with random unit embeddings.
    pub fn with_random_words(count: usize, dim: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let rows = (0..count)
            .map(|i| {
                let mut vector: Vec<f32> =
                    (0..dim).map(|_| rng.random_range(-1.0_f32..1.0)).collect();
                let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > f32::EPSILON {
                    for v in &mut vector {
                        *v /= norm;
                    }
                }
                VocabularyWord {
                    word: format!("word{i:05}"),
                    embedding: Some(vector),
                    frequency_rank: Some(i as u32 + 1),
                }
            })
            .collect();
        Self::new(rows)
    }

    /// Makes every subsequent page request fail as unavailable.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::Relaxed);
    }

    /// Serves the first `pages` page requests, then fails every later one.
    pub fn fail_after_pages(&self, pages: usize) {
        self.fail_after.store(pages, Ordering::Relaxed);
    }

    /// Number of rows in the store.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl VocabularyStore for MockVocabularyStore {
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        include_embeddings: bool,
    ) -> ProviderResult<Vec<StoredVocabularyRow>> {
        let served = self.pages_served.fetch_add(1, Ordering::Relaxed);
        if self.fail.load(Ordering::Relaxed) || served >= self.fail_after.load(Ordering::Relaxed) {
            return Err(ProviderError::Unavailable {
                reason: "mock store set to fail".to_string(),
            });
        }

        let end = offset.saturating_add(limit).min(self.rows.len());
        let start = offset.min(end);

        Ok(self.rows[start..end]
            .iter()
            .map(|row| StoredVocabularyRow {
                word: row.word.clone(),
                embedding: include_embeddings.then(|| row.embedding.clone()).flatten(),
                frequency_rank: row.frequency_rank,
            })
            .collect())
    }
}

/// In-memory task store recording every field update.
#[derive(Default, Clone)]
pub struct MockTaskStore {
    records: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    next_id: Arc<AtomicUsize>,
}

impl MockTaskStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current record for a task, if any.
    pub fn record(&self, id: &str) -> Option<serde_json::Value> {
        self.records.lock().get(id).cloned()
    }

    /// Number of stored tasks.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` if no tasks are stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn create_task(&self, fields: serde_json::Value) -> ProviderResult<String> {
        let id = format!("task-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        self.records.lock().insert(id.clone(), fields);
        Ok(id)
    }

    async fn update_task_fields(
        &self,
        id: &str,
        fields: serde_json::Value,
    ) -> ProviderResult<()> {
        let mut records = self.records.lock();
        let record = records
            .entry(id.to_string())
            .or_insert_with(|| serde_json::json!({}));

        if let (Some(existing), Some(updates)) = (record.as_object_mut(), fields.as_object()) {
            for (key, value) in updates {
                existing.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}
