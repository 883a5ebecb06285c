use std::sync::Arc;
use std::time::Duration;

use crate::cache::EmbeddingCache;
use crate::provider::MockEmbeddingProvider;

const DIM: usize = 8;

fn cache_with(capacity: usize, ttl: Duration) -> (Arc<MockEmbeddingProvider>, EmbeddingCache) {
    let provider = Arc::new(MockEmbeddingProvider::new(DIM));
    let cache = EmbeddingCache::with_limits(provider.clone(), capacity, ttl);
    (provider, cache)
}

#[tokio::test]
async fn test_second_get_is_a_hit() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));

    let first = cache.get("coffee").await.unwrap();
    let second = cache.get("coffee").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(provider.call_count(), 1);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_keys_are_normalized() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));

    cache.get("Coffee").await.unwrap();
    cache.get("  coffee  ").await.unwrap();

    assert_eq!(provider.call_count(), 1);
    assert_eq!(cache.stats().size, 1);
}

#[tokio::test]
async fn test_expired_entry_is_a_miss() {
    let (provider, cache) = cache_with(16, Duration::from_millis(40));

    cache.get("coffee").await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    cache.get("coffee").await.unwrap();

    assert_eq!(provider.call_count(), 2);
    assert_eq!(cache.stats().misses, 2);
}

#[tokio::test]
async fn test_lru_evicts_least_recently_used() {
    let (provider, cache) = cache_with(2, Duration::from_secs(60));

    cache.get("alpha").await.unwrap();
    cache.get("beta").await.unwrap();
    // Touch alpha so beta becomes least recently used.
    cache.get("alpha").await.unwrap();
    cache.get("gamma").await.unwrap();

    assert_eq!(cache.stats().size, 2);

    let calls_before = provider.call_count();
    cache.get("alpha").await.unwrap();
    assert_eq!(provider.call_count(), calls_before);
    cache.get("beta").await.unwrap();
    assert_eq!(provider.call_count(), calls_before + 1);
}

#[tokio::test]
async fn test_batch_issues_one_call_for_misses() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));

    cache.get("bean").await.unwrap();
    assert_eq!(provider.call_count(), 1);

    let texts: Vec<String> = ["morning", "bean", "cup"]
        .iter()
        .map(|w| w.to_string())
        .collect();
    let vectors = cache.get_batch(&texts).await.unwrap();

    assert_eq!(vectors.len(), 3);
    // One additional call covering both misses.
    assert_eq!(provider.call_count(), 2);
    assert_eq!(provider.texts_embedded(), 3);

    // Input order preserved regardless of hit/miss mix.
    assert_eq!(vectors[0], provider.vector_for("morning"));
    assert_eq!(vectors[1], provider.vector_for("bean"));
    assert_eq!(vectors[2], provider.vector_for("cup"));
}

#[tokio::test]
async fn test_fully_cached_batch_skips_provider() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));

    let texts: Vec<String> = ["a", "b"].iter().map(|w| w.to_string()).collect();
    cache.get_batch(&texts).await.unwrap();
    cache.get_batch(&texts).await.unwrap();

    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_empty_batch() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));
    let vectors = cache.get_batch(&[]).await.unwrap();
    assert!(vectors.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_contextual_keys_are_distinct() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));

    let context = vec!["music".to_string(), "instrument".to_string()];
    let plain = cache.get("bass").await.unwrap();
    let contextual = cache.get_contextual("bass", &context).await.unwrap();

    assert_ne!(plain, contextual);
    assert_eq!(provider.call_count(), 2);
    assert_eq!(cache.stats().size, 2);

    // Same context hits the same entry.
    cache.get_contextual("bass", &context).await.unwrap();
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_contextual_text_format() {
    let context = vec!["music".to_string(), "instrument".to_string()];
    assert_eq!(
        EmbeddingCache::contextual_text("bass", &context),
        "bass (in context: music, instrument)"
    );
    assert_eq!(EmbeddingCache::contextual_text("bass", &[]), "bass");
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    let (provider, cache) = cache_with(16, Duration::from_secs(60));
    provider.set_failing(true);

    assert!(cache.get("coffee").await.is_err());

    // Nothing cached from the failed call.
    provider.set_failing(false);
    cache.get("coffee").await.unwrap();
    assert_eq!(cache.stats().size, 1);
}

#[tokio::test]
async fn test_clear_resets_counters() {
    let (_, cache) = cache_with(16, Duration::from_secs(60));

    cache.get("coffee").await.unwrap();
    cache.get("coffee").await.unwrap();
    cache.clear();

    let stats = cache.stats();
    assert_eq!(stats.size, 0);
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 0);
    assert!((stats.hit_rate() - 0.0).abs() < f64::EPSILON);
}
