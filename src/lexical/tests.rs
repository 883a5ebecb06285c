use super::*;

mod variant_tests {
    use super::is_morphological_variant;

    #[test]
    fn test_identical_words() {
        assert!(is_morphological_variant("mystery", "mystery"));
    }

    #[test]
    fn test_plural() {
        assert!(is_morphological_variant("mystery", "mysteries"));
        assert!(is_morphological_variant("cat", "cats"));
    }

    #[test]
    fn test_adverb_and_adjective_forms() {
        assert!(is_morphological_variant("mystery", "mysterious"));
        assert!(is_morphological_variant("mystery", "mysteriously"));
        assert!(is_morphological_variant("mysterious", "mysteriously"));
    }

    #[test]
    fn test_verb_inflections() {
        assert!(is_morphological_variant("run", "running"));
        assert!(is_morphological_variant("walk", "walked"));
    }

    #[test]
    fn test_negating_prefix() {
        assert!(is_morphological_variant("certainty", "uncertainty"));
        assert!(is_morphological_variant("happy", "unhappy"));
        assert!(is_morphological_variant("certainty", "uncertain"));
    }

    #[test]
    fn test_unrelated_words() {
        assert!(!is_morphological_variant("mystery", "assurance"));
        assert!(!is_morphological_variant("fire", "ice"));
        assert!(!is_morphological_variant("coffee", "ocean"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(is_morphological_variant("  Mystery ", "MYSTERIES"));
    }

    #[test]
    fn test_empty_input() {
        assert!(!is_morphological_variant("", "mystery"));
        assert!(!is_morphological_variant("mystery", ""));
    }
}

mod union_tests {
    use std::sync::Arc;

    use crate::cache::{EmbeddingCache, VocabularyPool};
    use crate::lexical::LexicalUnionFinder;
    use crate::provider::{MockEmbeddingProvider, MockVocabularyStore, VocabularyWord};

    fn row(word: &str, vector: [f32; 3]) -> VocabularyWord {
        VocabularyWord {
            word: word.to_string(),
            embedding: Some(vector.to_vec()),
            frequency_rank: None,
        }
    }

    async fn finder_with(rows: Vec<VocabularyWord>) -> LexicalUnionFinder {
        let provider = Arc::new(
            MockEmbeddingProvider::new(3)
                .with_vector("fire", vec![1.0, 0.0, 0.0])
                .with_vector("ice", vec![0.0, 1.0, 0.0]),
        );
        let embeddings = Arc::new(EmbeddingCache::new(provider));

        let store = Arc::new(MockVocabularyStore::new(rows));
        let pool = Arc::new(VocabularyPool::new(store));
        pool.initialize(true).await;

        LexicalUnionFinder::new(embeddings, pool)
    }

    #[tokio::test]
    async fn test_joint_score_ranks_both_anchors_over_one() {
        let finder = finder_with(vec![
            row("steam", [0.707, 0.707, 0.0]),
            row("ember", [0.95, 0.1, 0.0]),
            row("rock", [0.0, 0.0, 1.0]),
        ])
        .await;

        let words = finder.find_jointly_relevant("fire", "ice", 2).await.unwrap();
        assert_eq!(words, vec!["steam", "ember"]);
    }

    #[tokio::test]
    async fn test_anchor_variants_are_excluded() {
        let finder = finder_with(vec![
            row("fires", [1.0, 0.0, 0.0]),
            row("iced", [0.0, 1.0, 0.0]),
            row("steam", [0.707, 0.707, 0.0]),
        ])
        .await;

        let words = finder.find_jointly_relevant("fire", "ice", 3).await.unwrap();
        assert_eq!(words, vec!["steam"]);
    }

    #[tokio::test]
    async fn test_variants_of_selected_words_are_skipped() {
        let finder = finder_with(vec![
            row("steam", [0.71, 0.71, 0.0]),
            row("steams", [0.5, 0.8, 0.0]),
            row("ember", [0.95, 0.1, 0.0]),
        ])
        .await;

        let words = finder.find_jointly_relevant("fire", "ice", 2).await.unwrap();
        assert_eq!(words, vec!["steam", "ember"]);
    }

    #[tokio::test]
    async fn test_zero_count() {
        let finder = finder_with(vec![row("steam", [0.707, 0.707, 0.0])]).await;
        let words = finder.find_jointly_relevant("fire", "ice", 0).await.unwrap();
        assert!(words.is_empty());
    }

    #[tokio::test]
    async fn test_exhausted_candidates_return_fewer() {
        let finder = finder_with(vec![row("steam", [0.707, 0.707, 0.0])]).await;
        let words = finder.find_jointly_relevant("fire", "ice", 5).await.unwrap();
        assert_eq!(words.len(), 1);
    }
}

mod noise_floor_tests {
    use std::sync::Arc;

    use crate::cache::{EmbeddingCache, NoiseFloorCache, VocabularyPool};
    use crate::lexical::NoiseFloorFinder;
    use crate::provider::{
        MockEmbeddingProvider, MockGenerativeProvider, MockVocabularyStore, VocabularyWord,
    };

    fn row(word: &str, vector: [f32; 3]) -> VocabularyWord {
        VocabularyWord {
            word: word.to_string(),
            embedding: Some(vector.to_vec()),
            frequency_rank: None,
        }
    }

    async fn finder_with(
        rows: Vec<VocabularyWord>,
        include_embeddings: bool,
    ) -> (Arc<MockEmbeddingProvider>, NoiseFloorFinder) {
        let provider = Arc::new(
            MockEmbeddingProvider::new(3)
                .with_vector("coffee", vec![1.0, 0.0, 0.0])
                .with_vector("espresso", vec![0.9, 0.2, 0.0])
                .with_vector("tea", vec![0.6, 0.4, 0.0]),
        );
        let embeddings = Arc::new(EmbeddingCache::new(provider.clone()));

        let store = Arc::new(MockVocabularyStore::new(rows));
        let pool = Arc::new(VocabularyPool::new(store));
        pool.initialize(include_embeddings).await;

        let generative = Arc::new(MockGenerativeProvider::new(
            vec!["espresso", "tea"],
            vec![],
        ));
        let finder = NoiseFloorFinder::new(
            Arc::new(NoiseFloorCache::new()),
            embeddings,
            pool,
            generative,
        );
        (provider, finder)
    }

    #[tokio::test]
    async fn test_neighbors_ranked_by_similarity() {
        let (_, finder) = finder_with(
            vec![
                row("espresso", [0.9, 0.2, 0.0]),
                row("tea", [0.6, 0.4, 0.0]),
                row("granite", [0.0, 0.0, 1.0]),
            ],
            true,
        )
        .await;

        let floor = finder.nearest_neighbors("coffee", &[], 2).await.unwrap();
        assert_eq!(floor.len(), 2);
        assert_eq!(floor[0].word, "espresso");
        assert_eq!(floor[1].word, "tea");
        assert!(floor[0].similarity > floor[1].similarity);
    }

    #[tokio::test]
    async fn test_seed_variants_excluded_from_floor() {
        let (_, finder) = finder_with(
            vec![row("coffees", [1.0, 0.0, 0.0]), row("tea", [0.6, 0.4, 0.0])],
            true,
        )
        .await;

        let floor = finder.nearest_neighbors("coffee", &[], 5).await.unwrap();
        let words: Vec<&str> = floor.iter().map(|n| n.word.as_str()).collect();
        assert_eq!(words, vec!["tea"]);
    }

    #[tokio::test]
    async fn test_second_call_hits_cache() {
        let (provider, finder) = finder_with(vec![row("tea", [0.6, 0.4, 0.0])], true).await;

        finder.default_floor("coffee", &[]).await.unwrap();
        let calls = provider.call_count();
        finder.default_floor("coffee", &[]).await.unwrap();
        assert_eq!(provider.call_count(), calls);
    }

    #[tokio::test]
    async fn test_generative_fallback_when_pool_has_no_embeddings() {
        let (_, finder) = finder_with(vec![row("tea", [0.6, 0.4, 0.0])], false).await;

        let floor = finder.nearest_neighbors("coffee", &[], 2).await.unwrap();
        assert_eq!(floor.len(), 2);
        assert_eq!(floor[0].word, "espresso");
        assert_eq!(floor[1].word, "tea");
    }
}
