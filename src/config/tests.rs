use super::*;
use serial_test::serial;
use std::env;

fn with_env_vars<F, R>(vars: &[(&str, &str)], f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, value) in vars {
        unsafe { env::set_var(key, value) };
    }

    let result = f();

    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    for (key, _) in vars {
        unsafe { env::remove_var(key) };
    }

    result
}

fn clear_lexbridge_env() {
    // SAFETY: Test code only, we accept the thread-safety risk in tests.
    unsafe {
        env::remove_var("LEXBRIDGE_OPENAI_API_KEY");
        env::remove_var("LEXBRIDGE_ANTHROPIC_API_KEY");
        env::remove_var("LEXBRIDGE_EMBEDDING_MODEL");
        env::remove_var("LEXBRIDGE_EMBEDDING_DIM");
        env::remove_var("LEXBRIDGE_EMBEDDING_CACHE_CAPACITY");
        env::remove_var("LEXBRIDGE_EMBEDDING_CACHE_TTL_SECS");
        env::remove_var("LEXBRIDGE_NOISE_FLOOR_CAPACITY");
        env::remove_var("LEXBRIDGE_NOISE_FLOOR_TTL_SECS");
        env::remove_var("LEXBRIDGE_VOCABULARY_MAX_WORDS");
        env::remove_var("LEXBRIDGE_VOCABULARY_PAGE_SIZE");
        env::remove_var("LEXBRIDGE_BOOTSTRAP_SAMPLES");
        env::remove_var("LEXBRIDGE_PRECOMPUTE_TTL_SECS");
        env::remove_var("LEXBRIDGE_PRECOMPUTE_CAPACITY");
        env::remove_var("LEXBRIDGE_PRECOMPUTE_WAIT_SECS");
    }
}

#[test]
fn test_default_config() {
    let config = Config::default();

    assert!(config.openai_api_key.is_none());
    assert!(config.anthropic_api_key.is_none());
    assert_eq!(config.embedding_model, "text-embedding-3-small");
    assert_eq!(config.embedding_dim, 1536);
    assert_eq!(config.embedding_cache_capacity, 10_000);
    assert_eq!(config.embedding_cache_ttl, Duration::from_secs(3600));
    assert_eq!(config.vocabulary_max_words, 50_000);
    assert_eq!(config.precompute_capacity, 1_000);
    assert_eq!(config.precompute_wait, Duration::from_secs(5));
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_lexbridge_env();

    let config = Config::from_env().expect("defaults should load");
    assert_eq!(config.embedding_dim, 1536);
    assert_eq!(config.bootstrap_samples, 200);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_lexbridge_env();

    let config = with_env_vars(
        &[
            ("LEXBRIDGE_EMBEDDING_DIM", "768"),
            ("LEXBRIDGE_EMBEDDING_CACHE_CAPACITY", "500"),
            ("LEXBRIDGE_PRECOMPUTE_TTL_SECS", "60"),
            ("LEXBRIDGE_OPENAI_API_KEY", "sk-test"),
        ],
        || Config::from_env().expect("overrides should parse"),
    );

    assert_eq!(config.embedding_dim, 768);
    assert_eq!(config.embedding_cache_capacity, 500);
    assert_eq!(config.precompute_ttl, Duration::from_secs(60));
    assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
}

#[test]
#[serial]
fn test_from_env_blank_key_is_none() {
    clear_lexbridge_env();

    let config = with_env_vars(&[("LEXBRIDGE_OPENAI_API_KEY", "   ")], || {
        Config::from_env().expect("blank key should load")
    });

    assert!(config.openai_api_key.is_none());
}

#[test]
#[serial]
fn test_from_env_invalid_integer() {
    clear_lexbridge_env();

    let result = with_env_vars(&[("LEXBRIDGE_EMBEDDING_DIM", "not-a-number")], || {
        Config::from_env()
    });

    assert!(matches!(
        result,
        Err(ConfigError::IntParseError {
            var: "LEXBRIDGE_EMBEDDING_DIM",
            ..
        })
    ));
}

#[test]
fn test_validate_rejects_zero_dim() {
    let config = Config {
        embedding_dim: 0,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ZeroValue { .. })
    ));
}

#[test]
fn test_validate_default_ok() {
    assert!(Config::default().validate().is_ok());
}
