//! Client ID assignment.

use tessera_core::ClientId;

/// Returns the client ID carried by the cookie, or a fresh one.
///
/// Well-formed cookie values are returned unchanged; anything else,
/// including a missing cookie, yields a new random ID.
#[must_use]
pub fn resolve_client_id(cookie: Option<&str>) -> ClientId {
    cookie.and_then(ClientId::parse).unwrap_or_else(ClientId::generate)
}
