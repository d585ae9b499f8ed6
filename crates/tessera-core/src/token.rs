//! User session tokens.
//!
//! A [`Token`] is a compact, JWT-shaped identity claim:
//!
//! ```text
//! base64url(header) . base64url(payload) . base64url(signature)
//! ```
//!
//! Unsigned tokens use `"alg": "none"` and an empty signature segment.
//! Signed tokens use ES256 and carry the signing key's identifier hash as
//! their `kid`.
//!
//! Tokens are immutable. Every adjustment ([`Token::with_duration`],
//! [`Token::with_token_id`], [`Token::signed_with`]) returns a new token, and
//! any adjustment of an already signed token drops its signature.
//!
//! # Example
//!
//! ```
//! use tessera_core::Token;
//!
//! let token = Token::issue("7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a", Some("alice"), 1_700_000_000)
//!     .with_duration(3600);
//!
//! assert!(token.is_subject("alice"));
//! assert!(token.is_valid_now(1_700_000_100));
//! assert!(!token.is_valid_now(1_700_003_600));
//!
//! let parsed = Token::parse(&token.to_string()).unwrap();
//! assert_eq!(parsed, token);
//! ```

use crate::api_key::{ApiKey, SIGNING_ALGORITHM};
use crate::error::TokenError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Issuer and audience stamped on every issued token.
pub const TOKEN_ISSUER: &str = "croct.io";

/// Token type declared in the header.
pub const TOKEN_TYPE: &str = "JWT";

/// Algorithm name of unsigned tokens.
pub const UNSIGNED_ALGORITHM: &str = "none";

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    /// Token type, always `JWT` for issued tokens.
    pub typ: String,

    /// Signature algorithm (`none` or `ES256`).
    pub alg: String,

    /// Identifier hash of the key that signed the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,

    /// Application the token was issued for.
    #[serde(rename = "appId", default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

/// Token audience, either a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    /// A single audience.
    One(String),
    /// Several audiences.
    Many(Vec<String>),
}

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,

    /// Audience.
    pub aud: Audience,

    /// Issue time, in seconds since the epoch.
    pub iat: i64,

    /// Expiration time, in seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Subject; absent for anonymous tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Token ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

/// An immutable, optionally signed identity claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    header: TokenHeader,
    claims: TokenClaims,
    // Encoded segments are kept verbatim so parsed tokens export byte-for-byte.
    encoded_header: String,
    encoded_claims: String,
    signature: String,
}

impl Token {
    /// Issues a new unsigned token.
    ///
    /// A `None` subject issues an anonymous token. The token has no
    /// expiration until [`Token::with_duration`] is applied.
    #[must_use]
    pub fn issue(app_id: &str, subject: Option<&str>, now: i64) -> Self {
        let header = TokenHeader {
            typ: TOKEN_TYPE.to_string(),
            alg: UNSIGNED_ALGORITHM.to_string(),
            kid: None,
            app_id: Some(app_id.to_string()),
        };

        let claims = TokenClaims {
            iss: TOKEN_ISSUER.to_string(),
            aud: Audience::One(TOKEN_ISSUER.to_string()),
            iat: now,
            exp: None,
            sub: subject.map(str::to_string),
            jti: None,
        };

        Self::unsigned(header, claims)
    }

    /// Parses a token from its compact form.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if the value does not have two or three
    /// dot-separated segments, or if the header or payload is not valid
    /// base64url-encoded JSON.
    pub fn parse(value: &str) -> Result<Self, TokenError> {
        let segments: Vec<&str> = value.split('.').collect();

        let (encoded_header, encoded_claims, signature) = match segments.as_slice() {
            [header, claims] => (*header, *claims, ""),
            [header, claims, signature] => (*header, *claims, *signature),
            _ => {
                return Err(TokenError::malformed(format!(
                    "expected 2 or 3 segments, found {}",
                    segments.len()
                )))
            }
        };

        let header: TokenHeader =
            decode_segment(encoded_header).map_err(TokenError::invalid_header)?;
        let claims: TokenClaims =
            decode_segment(encoded_claims).map_err(TokenError::invalid_payload)?;

        if !signature.is_empty() {
            URL_SAFE_NO_PAD
                .decode(signature.trim_end_matches('='))
                .map_err(|e| TokenError::malformed(format!("invalid signature: {e}")))?;
        }

        Ok(Self {
            header,
            claims,
            encoded_header: encoded_header.to_string(),
            encoded_claims: encoded_claims.to_string(),
            signature: signature.to_string(),
        })
    }

    /// Returns a copy of this token that expires `seconds` after its issue time.
    ///
    /// The expiration saturates at `i64::MAX`.
    #[must_use]
    pub fn with_duration(&self, seconds: i64) -> Self {
        let mut claims = self.claims.clone();
        claims.exp = Some(claims.iat.saturating_add(seconds));
        Self::unsigned(self.header.clone(), claims)
    }

    /// Returns a copy of this token carrying the given token ID.
    #[must_use]
    pub fn with_token_id(&self, token_id: impl Into<String>) -> Self {
        let mut claims = self.claims.clone();
        claims.jti = Some(token_id.into());
        Self::unsigned(self.header.clone(), claims)
    }

    /// Returns a copy of this token signed with the given key.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the key has no private part.
    pub fn signed_with(&self, api_key: &ApiKey) -> Result<Self, TokenError> {
        let header = TokenHeader {
            alg: SIGNING_ALGORITHM.to_string(),
            kid: Some(api_key.identifier_hash()),
            ..self.header.clone()
        };

        let encoded_header = encode_segment(&header);
        let encoded_claims = encode_segment(&self.claims);
        let signature = api_key.sign(format!("{encoded_header}.{encoded_claims}").as_bytes())?;

        Ok(Self {
            header,
            claims: self.claims.clone(),
            encoded_header,
            encoded_claims,
            signature: URL_SAFE_NO_PAD.encode(signature),
        })
    }

    /// Returns `true` if the token carries a signature.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.header.alg != UNSIGNED_ALGORITHM && !self.signature.is_empty()
    }

    /// Returns `true` if `now` lies within the token's validity window.
    ///
    /// The window starts at the issue time (inclusive) and ends at the
    /// expiration time (exclusive). Tokens without expiration never expire.
    #[must_use]
    pub fn is_valid_now(&self, now: i64) -> bool {
        self.claims.iat <= now && self.claims.exp.map_or(true, |exp| exp > now)
    }

    /// Returns `true` if the token has no subject.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.claims.sub.is_none()
    }

    /// Returns `true` if the token's subject is exactly `subject`.
    #[must_use]
    pub fn is_subject(&self, subject: &str) -> bool {
        self.claims.sub.as_deref() == Some(subject)
    }

    /// Returns `true` if the token was signed by the given key.
    ///
    /// Only the key ID is compared; the signature itself is not verified.
    #[must_use]
    pub fn matches_key_id(&self, api_key: &ApiKey) -> bool {
        self.header.kid.as_deref() == Some(api_key.identifier_hash().as_str())
    }

    /// Returns `true` if this token was issued strictly after `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Token) -> bool {
        self.claims.iat > other.claims.iat
    }

    /// Returns the subject, or `None` for anonymous tokens.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.claims.sub.as_deref()
    }

    /// Returns the application ID from the header.
    #[must_use]
    pub fn application_id(&self) -> Option<&str> {
        self.header.app_id.as_deref()
    }

    /// Returns the token ID.
    #[must_use]
    pub fn token_id(&self) -> Option<&str> {
        self.claims.jti.as_deref()
    }

    /// Returns the key ID.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.header.kid.as_deref()
    }

    /// Returns the issue time in seconds since the epoch.
    #[must_use]
    pub fn issue_time(&self) -> i64 {
        self.claims.iat
    }

    /// Returns the expiration time in seconds since the epoch.
    #[must_use]
    pub fn expiration_time(&self) -> Option<i64> {
        self.claims.exp
    }

    /// Returns the decoded header.
    #[must_use]
    pub fn header(&self) -> &TokenHeader {
        &self.header
    }

    /// Returns the decoded claims.
    #[must_use]
    pub fn claims(&self) -> &TokenClaims {
        &self.claims
    }

    /// Returns the bytes covered by the signature (`header.payload`).
    #[must_use]
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.encoded_header, self.encoded_claims)
    }

    /// Returns the decoded signature, empty for unsigned tokens.
    #[must_use]
    pub fn signature(&self) -> Vec<u8> {
        URL_SAFE_NO_PAD
            .decode(self.signature.trim_end_matches('='))
            .unwrap_or_default()
    }

    fn unsigned(header: TokenHeader, claims: TokenClaims) -> Self {
        let header = TokenHeader {
            alg: UNSIGNED_ALGORITHM.to_string(),
            kid: None,
            ..header
        };

        Self {
            encoded_header: encode_segment(&header),
            encoded_claims: encode_segment(&claims),
            header,
            claims,
            signature: String::new(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.encoded_header, self.encoded_claims, self.signature
        )
    }
}

fn encode_segment<T: Serialize>(value: &T) -> String {
    // Header and claims only hold strings and integers, so encoding cannot fail.
    let json = serde_json::to_vec(value).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| e.to_string())?;

    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, APP_ID, NOW};
    use p256::ecdsa::signature::Verifier;
    use p256::ecdsa::Signature;
    use proptest::prelude::*;

    #[test]
    fn test_issue_anonymous_token() {
        let token = Token::issue(APP_ID, None, NOW);

        assert!(token.is_anonymous());
        assert!(!token.is_signed());
        assert_eq!(token.application_id(), Some(APP_ID));
        assert_eq!(token.issue_time(), NOW);
        assert_eq!(token.expiration_time(), None);
        assert_eq!(token.claims().iss, TOKEN_ISSUER);
        assert!(token.to_string().ends_with('.'));
    }

    #[test]
    fn test_with_duration_sets_expiration() {
        let token = Token::issue(APP_ID, Some("alice"), NOW).with_duration(60);

        assert_eq!(token.expiration_time(), Some(NOW + 60));
        assert!(token.is_subject("alice"));
        assert!(!token.is_subject("bob"));
    }

    #[test]
    fn test_huge_duration_saturates() {
        let token = Token::issue(APP_ID, None, NOW).with_duration(i64::MAX);

        assert_eq!(token.expiration_time(), Some(i64::MAX));
        assert!(token.is_valid_now(NOW));
    }

    #[test]
    fn test_validity_window() {
        let token = fixtures::anonymous_token(NOW, 60);

        assert!(!token.is_valid_now(NOW - 1));
        assert!(token.is_valid_now(NOW));
        assert!(token.is_valid_now(NOW + 59));
        assert!(!token.is_valid_now(NOW + 60));
    }

    #[test]
    fn test_token_without_expiration_never_expires() {
        let token = Token::issue(APP_ID, None, NOW);
        assert!(token.is_valid_now(i64::MAX));
    }

    #[test]
    fn test_parse_round_trips_unsigned_token() {
        let token = fixtures::user_token("alice", NOW, 3600).with_token_id("t-1");
        let parsed = Token::parse(&token.to_string()).unwrap();

        assert_eq!(parsed, token);
        assert_eq!(parsed.token_id(), Some("t-1"));
    }

    #[test]
    fn test_parse_accepts_two_segments() {
        let token = fixtures::anonymous_token(NOW, 60);
        let compact = token.to_string();
        let parsed = Token::parse(compact.trim_end_matches('.')).unwrap();

        assert_eq!(parsed.issue_time(), NOW);
        assert!(!parsed.is_signed());
    }

    #[test]
    fn test_parse_rejects_malformed_values() {
        assert!(matches!(Token::parse(""), Err(TokenError::InvalidHeader(_)) | Err(TokenError::Malformed(_))));
        assert!(matches!(Token::parse("abc"), Err(TokenError::Malformed(_))));
        assert!(matches!(Token::parse("a.b.c.d"), Err(TokenError::Malformed(_))));
        assert!(matches!(Token::parse("!!!.e30."), Err(TokenError::InvalidHeader(_))));

        let header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"none"}"#);
        let claims = URL_SAFE_NO_PAD.encode(br#"{"iss":"croct.io"}"#);
        assert!(matches!(
            Token::parse(&format!("{header}.{claims}.")),
            Err(TokenError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_parse_preserves_foreign_encoding() {
        // Key order differs from the one this crate serializes with.
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","appId":"app","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(br#"{"aud":["croct.io"],"iat":1,"iss":"croct.io"}"#);
        let compact = format!("{header}.{claims}.");

        let token = Token::parse(&compact).unwrap();
        assert_eq!(token.to_string(), compact);
        assert_eq!(
            token.claims().aud,
            Audience::Many(vec!["croct.io".to_string()])
        );
    }

    #[test]
    fn test_signed_token_carries_key_id_and_valid_signature() {
        let api_key = fixtures::api_key();
        let token = fixtures::anonymous_token(NOW, 60)
            .with_token_id("t-1")
            .signed_with(&api_key)
            .unwrap();

        assert!(token.is_signed());
        assert!(token.matches_key_id(&api_key));
        assert_eq!(token.header().alg, "ES256");

        let signature = Signature::from_slice(&token.signature()).unwrap();
        let verifying_key = api_key.verifying_key().unwrap();
        assert!(verifying_key
            .verify(token.signing_input().as_bytes(), &signature)
            .is_ok());

        let parsed = Token::parse(&token.to_string()).unwrap();
        assert!(parsed.is_signed());
        assert!(parsed.matches_key_id(&api_key));
    }

    #[test]
    fn test_key_id_mismatch() {
        let token = fixtures::anonymous_token(NOW, 60)
            .signed_with(&fixtures::api_key())
            .unwrap();

        let other = ApiKey::parse("11111111-1111-1111-1111-111111111111").unwrap();
        assert!(!token.matches_key_id(&other));
    }

    #[test]
    fn test_signing_without_private_key_fails() {
        let api_key = ApiKey::parse(fixtures::API_KEY_IDENTIFIER).unwrap();
        let result = fixtures::anonymous_token(NOW, 60).signed_with(&api_key);
        assert!(matches!(result, Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_adjusting_signed_token_drops_signature() {
        let signed = fixtures::anonymous_token(NOW, 60)
            .signed_with(&fixtures::api_key())
            .unwrap();

        let adjusted = signed.with_duration(120);
        assert!(!adjusted.is_signed());
        assert_eq!(adjusted.key_id(), None);
    }

    #[test]
    fn test_is_newer_than() {
        let older = fixtures::anonymous_token(NOW, 60);
        let newer = fixtures::anonymous_token(NOW + 1, 60);

        assert!(newer.is_newer_than(&older));
        assert!(!older.is_newer_than(&newer));
        assert!(!older.is_newer_than(&older.clone()));
    }

    proptest! {
        #[test]
        fn prop_expired_or_future_tokens_are_invalid(
            iat in 0i64..2_000_000_000,
            duration in 1i64..1_000_000,
            offset in 0i64..1_000_000,
        ) {
            let token = fixtures::anonymous_token(iat, duration);
            prop_assert!(!token.is_valid_now(iat + duration + offset));
            prop_assert!(!token.is_valid_now(iat - 1 - offset));
        }
    }
}
