//! Error types for the identity primitives.
//!
//! Parsing failures of client-supplied values are ordinary values here; it is
//! up to the caller to decide whether they are recoverable. The middleware
//! treats every [`TokenError`] raised while parsing a cookie as "no token".

use thiserror::Error;

/// Errors raised while parsing, building or signing a [`Token`](crate::Token).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token does not have the `header.payload[.signature]` shape.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The header segment could not be decoded.
    #[error("invalid token header: {0}")]
    InvalidHeader(String),

    /// The payload segment could not be decoded.
    #[error("invalid token payload: {0}")]
    InvalidPayload(String),

    /// The signing key could not produce a signature.
    #[error("failed to sign token: {0}")]
    Signing(#[from] ApiKeyError),
}

impl TokenError {
    /// Create a new malformed token error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    /// Create a new invalid header error.
    pub fn invalid_header(reason: impl Into<String>) -> Self {
        Self::InvalidHeader(reason.into())
    }

    /// Create a new invalid payload error.
    pub fn invalid_payload(reason: impl Into<String>) -> Self {
        Self::InvalidPayload(reason.into())
    }
}

/// Errors raised while parsing or using an [`ApiKey`](crate::ApiKey).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiKeyError {
    /// The key identifier is not a UUID.
    #[error("invalid API key identifier: {0}")]
    InvalidIdentifier(String),

    /// The private key could not be decoded as a PKCS#8 P-256 key.
    #[error("invalid API key private key: {0}")]
    InvalidPrivateKey(String),

    /// The key has no private part, so it cannot sign.
    #[error("API key {identifier} has no private key")]
    MissingPrivateKey {
        /// Identifier of the key that was asked to sign.
        identifier: String,
    },
}
