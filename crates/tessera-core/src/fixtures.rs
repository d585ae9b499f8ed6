//! Test fixtures for identity primitives.
//!
//! Available to this crate's tests and, through the `test-fixtures` feature,
//! to downstream test suites.

use crate::{ApiKey, Token};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use p256::pkcs8::EncodePrivateKey;
use p256::SecretKey;
use rand::rngs::OsRng;

/// Application ID used by fixtures.
pub const APP_ID: &str = "7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a";

/// API key identifier used by fixtures.
pub const API_KEY_IDENTIFIER: &str = "00000000-0000-0000-0000-000000000000";

/// A fixed instant (seconds since the epoch) tests can freeze the clock at.
pub const NOW: i64 = 1_700_000_000;

/// Returns a freshly generated API key string in `identifier:ES256;key` form.
#[must_use]
pub fn api_key_string() -> String {
    api_key_string_for(API_KEY_IDENTIFIER)
}

/// Returns a freshly generated API key string for the given identifier.
#[must_use]
pub fn api_key_string_for(identifier: &str) -> String {
    let secret = SecretKey::random(&mut OsRng);
    let der = secret
        .to_pkcs8_der()
        .expect("generated P-256 key encodes as PKCS#8");

    format!("{identifier}:ES256;{}", STANDARD.encode(der.as_bytes()))
}

/// Returns a freshly generated API key able to sign tokens.
#[must_use]
pub fn api_key() -> ApiKey {
    ApiKey::parse(&api_key_string()).expect("fixture API key is valid")
}

/// Returns an unsigned anonymous token issued at `iat` and valid for `duration` seconds.
#[must_use]
pub fn anonymous_token(iat: i64, duration: i64) -> Token {
    Token::issue(APP_ID, None, iat).with_duration(duration)
}

/// Returns an unsigned token for `subject` issued at `iat` and valid for `duration` seconds.
#[must_use]
pub fn user_token(subject: &str, iat: i64, duration: i64) -> Token {
    Token::issue(APP_ID, Some(subject), iat).with_duration(duration)
}
