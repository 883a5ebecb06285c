//! End-to-end scoring pipeline: embedding cache, vocabulary pool, bootstrap
//! null distributions, and the stats cache, wired with mock providers.

use std::sync::Arc;

use lexbridge::{
    EmbeddingCache, MockEmbeddingProvider, MockVocabularyStore, Prompt, StatsCache, VocabularyPool,
    bootstrap_null_distribution, score_submission,
};

const DIM: usize = 16;

fn unit(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    for x in &mut v {
        *x /= norm;
    }
    v
}

/// Unit vector along `base_axis`, tilted by `tilt` along `tilt_axis`.
fn near(base_axis: usize, tilt_axis: usize, tilt: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[base_axis] = 1.0;
    v[tilt_axis] = tilt;
    unit(v)
}

#[tokio::test]
async fn test_coffee_submission_beats_null_distribution() {
    let provider = Arc::new(
        MockEmbeddingProvider::new(DIM)
            .with_vector("coffee", near(0, 1, 0.0))
            .with_vector("morning", near(0, 1, 0.35))
            .with_vector("bean", near(0, 2, 0.3))
            .with_vector("cup", near(0, 3, 0.4)),
    );
    let cache = Arc::new(EmbeddingCache::new(provider));

    let seed = cache.get("coffee").await.unwrap();
    let words: Vec<String> = ["morning", "bean", "cup"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    let word_embeddings = cache.get_batch(&words).await.unwrap();

    let prompt = Prompt::Seeded(seed);
    let result = score_submission(&prompt, &word_embeddings);
    assert!(result.valid);
    assert!(result.relevance > 0.8);

    // Null baseline: 120 random triples drawn from a 200-word vocabulary.
    let store = Arc::new(MockVocabularyStore::with_random_words(200, DIM, 5));
    let pool = VocabularyPool::new(store);
    pool.initialize(true).await;
    let vocabulary: Vec<_> = pool
        .embedded_words()
        .into_iter()
        .map(|(_, vector)| vector)
        .collect();

    let null = bootstrap_null_distribution(&prompt, &vocabulary, 3, 120, 42);
    assert_eq!(null.relevance.len(), 120);
    assert!(result.relevance > null.relevance.mean());

    let percentile = null.relevance.percentile_of(result.relevance);
    assert!(percentile > 50.0, "expected >50, got {percentile}");
}

#[tokio::test]
async fn test_stats_cache_scores_strong_submissions_high() {
    let store = Arc::new(MockVocabularyStore::with_random_words(150, DIM, 9));
    let pool = VocabularyPool::new(store);
    pool.initialize(true).await;

    let stats = StatsCache::with_samples(100);
    stats.initialize(&pool);
    assert!(stats.is_initialized());

    // Random vocabulary draws hover near zero relevance in this space, so a
    // deliberately coherent submission should land far above the median.
    let strong = stats.relevance_percentile(0.9, 3);
    let weak = stats.relevance_percentile(-0.9, 3);
    assert!(strong > 90.0);
    assert!(weak < 10.0);
    assert!(strong <= 99.9 && weak >= 0.1);
}

#[tokio::test]
async fn test_random_submission_scores_low() {
    let provider = Arc::new(MockEmbeddingProvider::new(DIM).with_vector("coffee", near(0, 1, 0.0)));
    let cache = EmbeddingCache::new(provider);

    let seed = cache.get("coffee").await.unwrap();
    let words: Vec<String> = ["zeppelin", "quartz", "umbrella"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    let word_embeddings = cache.get_batch(&words).await.unwrap();

    // Hash-random vectors are near-orthogonal to the seed at this dimension.
    let result = score_submission(&Prompt::Seeded(seed), &word_embeddings);
    assert!(result.relevance < 0.5);
}
