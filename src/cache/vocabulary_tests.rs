use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{FALLBACK_WORDS, VocabularyPool};
use crate::provider::{MockVocabularyStore, StoredVocabularyRow};

const DIM: usize = 8;

async fn loaded_pool(words: usize, page_size: usize) -> VocabularyPool {
    let store = Arc::new(MockVocabularyStore::with_random_words(words, DIM, 7));
    let pool = VocabularyPool::with_limits(store, 50_000, page_size);
    pool.initialize(true).await;
    pool
}

#[tokio::test]
async fn test_initialize_pages_through_store() {
    let pool = loaded_pool(250, 100).await;
    let stats = pool.stats();
    assert!(stats.initialized);
    assert_eq!(stats.words, 250);
    assert_eq!(stats.with_embeddings, 250);
}

#[tokio::test]
async fn test_word_cap_stops_pagination() {
    let store = Arc::new(MockVocabularyStore::with_random_words(500, DIM, 7));
    let pool = VocabularyPool::with_limits(store, 120, 100);
    pool.initialize(false).await;
    assert_eq!(pool.stats().words, 120);
}

#[tokio::test]
async fn test_store_failure_leaves_pool_initialized_but_empty() {
    let store = Arc::new(MockVocabularyStore::with_random_words(100, DIM, 7));
    store.set_failing(true);
    let pool = VocabularyPool::new(store);
    pool.initialize(true).await;

    let stats = pool.stats();
    assert!(stats.initialized);
    assert_eq!(stats.words, 0);

    // Draws fall back to the built-in list instead of erroring.
    let word = pool.get_random();
    assert!(FALLBACK_WORDS.contains(&word.as_str()));
}

#[tokio::test]
async fn test_mid_pagination_failure_discards_loaded_pages() {
    let store = Arc::new(MockVocabularyStore::with_random_words(100, DIM, 7));
    store.fail_after_pages(1);
    let pool = VocabularyPool::with_limits(store, 50_000, 10);
    pool.initialize(true).await;

    // The first page loaded fine, but the pool must end up empty, not
    // serving a tenth of the vocabulary.
    let stats = pool.stats();
    assert!(stats.initialized);
    assert_eq!(stats.words, 0);
    assert_eq!(stats.with_embeddings, 0);
    assert!(FALLBACK_WORDS.contains(&pool.get_random().as_str()));
}

#[tokio::test]
async fn test_malformed_stored_vector_loads_word_without_embedding() {
    let rows = vec![
        StoredVocabularyRow {
            word: "coffee".to_string(),
            embedding: Some(serde_json::json!([0.1, 0.2, 0.3])),
            frequency_rank: None,
        },
        StoredVocabularyRow {
            word: "tea".to_string(),
            embedding: Some(serde_json::json!("[0.4,0.5,0.6]")),
            frequency_rank: None,
        },
        StoredVocabularyRow {
            word: "mud".to_string(),
            embedding: Some(serde_json::json!({"oops": true})),
            frequency_rank: None,
        },
    ];
    let pool = VocabularyPool::new(Arc::new(MockVocabularyStore::with_raw_rows(rows)));
    pool.initialize(true).await;

    let stats = pool.stats();
    assert_eq!(stats.words, 3);
    assert_eq!(stats.with_embeddings, 2);
    assert_eq!(pool.embedding_of("tea"), Some(vec![0.4, 0.5, 0.6]));
    assert!(pool.embedding_of("mud").is_none());
}

#[tokio::test]
async fn test_batch_without_duplicates_is_distinct() {
    let pool = loaded_pool(50, 100).await;
    let batch = pool.get_random_batch(20, false);
    let unique: HashSet<&String> = batch.iter().collect();
    assert_eq!(batch.len(), 20);
    assert_eq!(unique.len(), 20);
}

#[tokio::test]
async fn test_oversized_batch_without_duplicates_is_capped() {
    let pool = loaded_pool(10, 100).await;
    let batch = pool.get_random_batch(50, false);
    assert_eq!(batch.len(), 10);
}

#[tokio::test]
async fn test_oversized_batch_with_duplicates_fills_request() {
    let pool = loaded_pool(10, 100).await;
    let batch = pool.get_random_batch(50, true);
    assert_eq!(batch.len(), 50);
}

#[tokio::test]
async fn test_random_with_embeddings_pairs_words_and_vectors() {
    let pool = loaded_pool(50, 100).await;
    let pairs = pool.get_random_with_embeddings(10);
    assert_eq!(pairs.len(), 10);
    for (word, vector) in &pairs {
        assert!(pool.contains(word));
        assert_eq!(vector.len(), DIM);
    }
}

#[tokio::test]
async fn test_random_with_embeddings_empty_when_loaded_without() {
    let store = Arc::new(MockVocabularyStore::with_random_words(50, DIM, 7));
    let pool = VocabularyPool::new(store);
    pool.initialize(false).await;
    assert!(pool.get_random_with_embeddings(10).is_empty());
}

#[tokio::test]
async fn test_contains_normalizes() {
    let pool = loaded_pool(20, 100).await;
    let word = pool.get_random();
    assert!(pool.contains(&format!("  {}  ", word.to_uppercase())));
    assert!(!pool.contains("definitely-not-a-word"));
}

#[tokio::test]
async fn test_needs_refresh_before_and_after_load() {
    let store = Arc::new(MockVocabularyStore::with_random_words(20, DIM, 7));
    let pool = VocabularyPool::new(store);
    assert!(pool.needs_refresh());
    pool.initialize(false).await;
    assert!(!pool.needs_refresh());
}
