//! Error types for identity resolution.

use tessera_config::ConfigError;
use tessera_core::TokenError;
use tessera_matcher::MatcherError;
use thiserror::Error;

/// A boxed error returned by user-supplied handlers and resolvers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while setting up or running the identity middleware.
///
/// Malformed client-supplied values (cookies, tokens, preview parameters)
/// never surface here; they are recovered from locally.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The configuration is invalid.
    #[error("invalid identity configuration: {0}")]
    Config(#[from] ConfigError),

    /// A route criterion failed to compile.
    #[error("invalid route matcher: {0}")]
    Matcher(#[from] MatcherError),

    /// Signature enforcement is enabled but no private key is available.
    #[error("signature enforcement requires an API key with a private key")]
    MissingSigningKey,

    /// A freshly issued token could not be signed.
    #[error("failed to sign user token: {0}")]
    Signing(#[from] TokenError),

    /// A resolved value cannot be carried in a header.
    #[error("value for header '{name}' is not a valid header value")]
    InvalidHeader {
        /// The header (or cookie header) being written.
        name: String,
    },

    /// A user-supplied resolver failed.
    #[error("{resolver} resolver failed: {source}")]
    Resolver {
        /// Which resolver failed ("user id" or "locale").
        resolver: &'static str,
        /// The resolver's error.
        #[source]
        source: BoxError,
    },

    /// The downstream handler failed.
    #[error("downstream handler failed: {0}")]
    Handler(#[source] BoxError),
}

impl IdentityError {
    /// Create a new invalid header error.
    pub fn invalid_header(name: impl Into<String>) -> Self {
        Self::InvalidHeader { name: name.into() }
    }

    /// Create a new resolver error.
    pub fn resolver(resolver: &'static str, source: BoxError) -> Self {
        Self::Resolver { resolver, source }
    }

    /// Returns `true` for setup errors that no retry can fix.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Matcher(_) | Self::MissingSigningKey
        )
    }

    /// Returns the error code used in JSON error envelopes.
    #[must_use]
    pub fn code(&self) -> &'static str {
        if self.is_configuration_error() {
            "IDENTITY_CONFIGURATION_ERROR"
        } else {
            "IDENTITY_RESOLUTION_FAILED"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(IdentityError::MissingSigningKey.is_configuration_error());
        assert!(IdentityError::Config(ConfigError::MissingAppId).is_configuration_error());

        let error = IdentityError::Handler("boom".into());
        assert!(!error.is_configuration_error());
        assert_eq!(error.code(), "IDENTITY_RESOLUTION_FAILED");
    }

    #[test]
    fn test_resolver_error_message() {
        let error = IdentityError::resolver("locale", "lookup timed out".into());
        assert_eq!(
            error.to_string(),
            "locale resolver failed: lookup timed out"
        );
        assert!(std::error::Error::source(&error).is_some());
    }
}
