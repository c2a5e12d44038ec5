//! Error types and fallback classification for the providers crate.

use thiserror::Error;

/// Errors that can occur while fetching a price from an upstream provider.
///
/// Each variant is classified into a [`FetchClass`] via the
/// [`class`](Self::class) method, which determines how the fetch chain
/// reacts to the error.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider signalled that its rate/usage quota is exhausted.
    /// This is distinct from "no data": it aborts the whole chain and
    /// must surface to the caller.
    #[error("Quota exhausted: {provider}")]
    QuotaExhausted {
        /// The provider that reported quota exhaustion
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider returned an error response or unusable payload.
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider responded but the payload could not be parsed.
    #[error("Malformed response from {provider}: {message}")]
    Malformed {
        /// The provider that returned the payload
        provider: String,
        /// Description of the parse failure
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// How the fetch chain should respond to a provider error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchClass {
    /// Abort the chain and surface the error to the caller.
    /// Only quota exhaustion is fatal: continuing would burn more quota
    /// and the caller must react differently than to an ordinary miss.
    Fatal,

    /// Treat this attempt as a miss and fall through to the next one.
    NextAttempt,
}

impl ProviderError {
    /// Returns the fallback classification for this error.
    pub fn class(&self) -> FetchClass {
        match self {
            Self::QuotaExhausted { .. } => FetchClass::Fatal,
            Self::Timeout { .. }
            | Self::Provider { .. }
            | Self::Malformed { .. }
            | Self::Network(_) => FetchClass::NextAttempt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exhausted_is_fatal() {
        let error = ProviderError::QuotaExhausted {
            provider: "ALCHEMY".to_string(),
        };
        assert_eq!(error.class(), FetchClass::Fatal);
    }

    #[test]
    fn test_timeout_falls_through() {
        let error = ProviderError::Timeout {
            provider: "COINGECKO".to_string(),
        };
        assert_eq!(error.class(), FetchClass::NextAttempt);
    }

    #[test]
    fn test_provider_error_falls_through() {
        let error = ProviderError::Provider {
            provider: "ALCHEMY".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(error.class(), FetchClass::NextAttempt);
    }

    #[test]
    fn test_malformed_falls_through() {
        let error = ProviderError::Malformed {
            provider: "ALCHEMY".to_string(),
            message: "empty data array".to_string(),
        };
        assert_eq!(error.class(), FetchClass::NextAttempt);
    }

    #[test]
    fn test_error_display() {
        let error = ProviderError::QuotaExhausted {
            provider: "ALCHEMY".to_string(),
        };
        assert_eq!(format!("{}", error), "Quota exhausted: ALCHEMY");

        let error = ProviderError::Provider {
            provider: "COINGECKO".to_string(),
            message: "HTTP 500".to_string(),
        };
        assert_eq!(format!("{}", error), "Provider error: COINGECKO - HTTP 500");
    }
}
