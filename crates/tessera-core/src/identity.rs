//! Identity value types.
//!
//! This module provides the small validated values that flow through the
//! identity layer:
//!
//! - [`ClientId`] - per-browser anonymous identifier persisted in a cookie
//! - [`AppId`] - the application a session token is scoped to
//! - [`SubjectReport`] - what an external user-id resolver says about the caller

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use uuid::Uuid;

/// Matches a UUID either as 32 hex digits or in 8-4-4-4-12 hyphenated form.
const UUID_PATTERN: &str =
    r"(?i)^(?:[a-f0-9]{32}|[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12})$";

fn uuid_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(UUID_PATTERN).expect("UUID pattern is valid"))
}

/// Returns `true` if the value is a UUID in compact or hyphenated form.
///
/// Braced and URN forms are rejected.
///
/// # Example
///
/// ```
/// use tessera_core::identity::is_uuid_like;
///
/// assert!(is_uuid_like("12345678-1234-1234-1234-123456789abc"));
/// assert!(is_uuid_like("123456781234123412341234567890ab"));
/// assert!(!is_uuid_like("{12345678-1234-1234-1234-123456789abc}"));
/// ```
#[must_use]
pub fn is_uuid_like(value: &str) -> bool {
    uuid_regex().is_match(value)
}

/// A stable, per-browser anonymous client identifier.
///
/// Client IDs are independent of authentication state: the same browser keeps
/// its client ID when users sign in or out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientId(String);

impl ClientId {
    /// Parses a client ID, returning `None` when the value is malformed.
    ///
    /// Well-formed values are kept verbatim, including their case and
    /// hyphenation.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        is_uuid_like(value).then(|| Self(value.to_string()))
    }

    /// Generates a fresh random (v4) client ID in hyphenated form.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Returns the client ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClientId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of the application session tokens are issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppId(String);

impl AppId {
    /// Parses an application ID, returning `None` when it is not UUID-shaped.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        is_uuid_like(value).then(|| Self(value.to_string()))
    }

    /// Returns the application ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The subject an external user-id resolver reports for a request.
///
/// The three states are distinct: `Undetermined` means the resolver has no
/// opinion and subject continuity is not enforced, whereas `Anonymous` is an
/// explicit statement that nobody is signed in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubjectReport {
    /// The resolver declined to state who the caller is.
    #[default]
    Undetermined,
    /// The caller is explicitly anonymous.
    Anonymous,
    /// The caller is the given user.
    User(String),
}

impl SubjectReport {
    /// Builds a report from an optional user ID (`None` = anonymous).
    #[must_use]
    pub fn from_user_id(user_id: Option<impl Into<String>>) -> Self {
        user_id.map_or(Self::Anonymous, |id| Self::User(id.into()))
    }

    /// Returns `true` unless the report is [`SubjectReport::Undetermined`].
    #[must_use]
    pub fn is_determined(&self) -> bool {
        !matches!(self, Self::Undetermined)
    }

    /// Returns the reported subject, if the report is determined.
    ///
    /// The outer `Option` is `None` for undetermined reports; the inner one is
    /// `None` for anonymous callers.
    #[must_use]
    pub fn subject(&self) -> Option<Option<&str>> {
        match self {
            Self::Undetermined => None,
            Self::Anonymous => Some(None),
            Self::User(id) => Some(Some(id.as_str())),
        }
    }
}
