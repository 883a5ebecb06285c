use thiserror::Error;

#[derive(Debug, Error)]
/// Errors returned by external providers and stores.
pub enum ProviderError {
    /// The provider could not be reached or timed out.
    #[error("provider unavailable: {reason}")]
    Unavailable {
        /// Error message.
        reason: String,
    },

    /// The provider answered with a payload we could not interpret.
    #[error("malformed provider response: {reason}")]
    MalformedResponse {
        /// Error message.
        reason: String,
    },

    /// A live provider was constructed without its API key configured.
    ///
    /// Config loading leaves keys optional; constructing the provider is
    /// where a missing credential becomes fatal.
    #[error("missing API key for {provider}")]
    MissingApiKey {
        /// Provider name.
        provider: &'static str,
    },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Unavailable {
            reason: err.to_string(),
        }
    }
}

/// Convenience result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
