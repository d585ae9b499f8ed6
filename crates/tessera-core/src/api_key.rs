//! Application API keys.
//!
//! An API key is an identifier, optionally followed by a private signing key:
//!
//! ```text
//! 00000000-0000-0000-0000-000000000000
//! 00000000-0000-0000-0000-000000000000:ES256;MIGHAgEAMBMGByqGSM49AgEG...
//! ```
//!
//! The private key is a base64-encoded PKCS#8 DER P-256 key. The `ES256;`
//! algorithm prefix is optional. Keys carrying a private part can sign user
//! tokens; the identifier hash becomes the token's key ID.

use crate::error::ApiKeyError;
use crate::identity::is_uuid_like;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::pkcs8::DecodePrivateKey;
use sha2::{Digest, Sha256};
use std::fmt;

/// The only signing algorithm accepted in private keys.
pub const SIGNING_ALGORITHM: &str = "ES256";

/// An application credential, optionally able to sign tokens.
#[derive(Clone)]
pub struct ApiKey {
    identifier: String,
    private_key: Option<SigningKey>,
}

impl ApiKey {
    /// Parses an API key in `identifier[:privateKey]` form.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_core::ApiKey;
    ///
    /// let key = ApiKey::parse("00000000-0000-0000-0000-000000000000").unwrap();
    /// assert!(!key.has_private_key());
    /// assert!(ApiKey::parse("not-a-key").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, ApiKeyError> {
        match value.split_once(':') {
            Some((identifier, private_key)) => Self::of(identifier, Some(private_key)),
            None => Self::of(value, None),
        }
    }

    /// Builds an API key from its parts.
    pub fn of(identifier: &str, private_key: Option<&str>) -> Result<Self, ApiKeyError> {
        if !is_uuid_like(identifier) {
            return Err(ApiKeyError::InvalidIdentifier(identifier.to_string()));
        }

        let private_key = private_key.map(decode_private_key).transpose()?;

        Ok(Self {
            identifier: identifier.to_string(),
            private_key,
        })
    }

    /// Builds an API key from an already decoded signing key.
    pub fn with_signing_key(identifier: &str, key: SigningKey) -> Result<Self, ApiKeyError> {
        if !is_uuid_like(identifier) {
            return Err(ApiKeyError::InvalidIdentifier(identifier.to_string()));
        }

        Ok(Self {
            identifier: identifier.to_string(),
            private_key: Some(key),
        })
    }

    /// Returns the key identifier.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Returns the lowercase hex SHA-256 digest of the identifier.
    ///
    /// Signed tokens carry this value as their key ID.
    #[must_use]
    pub fn identifier_hash(&self) -> String {
        hex::encode(Sha256::digest(self.identifier.as_bytes()))
    }

    /// Returns `true` if this key can sign tokens.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    /// Returns the public half of the signing key, if any.
    #[must_use]
    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        self.private_key.as_ref().map(VerifyingKey::from)
    }

    /// Signs a message with ECDSA P-256 / SHA-256.
    ///
    /// The signature is returned in the fixed-size `r || s` form used by JWS.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, ApiKeyError> {
        let key = self
            .private_key
            .as_ref()
            .ok_or_else(|| ApiKeyError::MissingPrivateKey {
                identifier: self.identifier.clone(),
            })?;

        let signature: Signature = key
            .try_sign(message)
            .map_err(|e| ApiKeyError::InvalidPrivateKey(e.to_string()))?;

        Ok(signature.to_bytes().to_vec())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("identifier", &self.identifier)
            .field(
                "private_key",
                &self.private_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn decode_private_key(value: &str) -> Result<SigningKey, ApiKeyError> {
    let encoded = match value.split_once(';') {
        Some((algorithm, encoded)) if algorithm == SIGNING_ALGORITHM => encoded,
        Some((algorithm, _)) => {
            return Err(ApiKeyError::InvalidPrivateKey(format!(
                "unsupported algorithm {algorithm}"
            )))
        }
        None => value,
    };

    let der = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiKeyError::InvalidPrivateKey(e.to_string()))?;

    SigningKey::from_pkcs8_der(&der).map_err(|e| ApiKeyError::InvalidPrivateKey(e.to_string()))
}
