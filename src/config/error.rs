use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or validating [`super::Config`].
pub enum ConfigError {
    /// An integer-valued variable could not be parsed.
    #[error("invalid integer in {var}: {value:?}")]
    IntParseError {
        /// Environment variable name.
        var: &'static str,
        /// Offending value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: ParseIntError,
    },

    /// A numeric setting that must be positive was zero.
    #[error("{var} must be non-zero")]
    ZeroValue {
        /// Environment variable name.
        var: &'static str,
    },
}
