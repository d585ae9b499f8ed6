//! Preview token lifecycle.
//!
//! A preview token arrives through the `croct-preview` query parameter or the
//! preview cookie, the query taking precedence. The literal `exit` leaves
//! preview mode; so does any token that is malformed or expired.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use super::sources::first_defined;

/// Query parameter carrying the preview token.
pub const PREVIEW_QUERY_PARAMETER: &str = "croct-preview";

/// Value requesting to leave preview mode.
pub const PREVIEW_EXIT: &str = "exit";

/// Why preview mode ends.
///
/// Every reason clears the preview cookie the same way; the reason only
/// feeds logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitReason {
    /// The visitor asked to leave preview mode.
    Requested,
    /// The token's `exp` claim has passed.
    Expired,
    /// The token could not be decoded.
    Malformed,
}

impl ExitReason {
    /// Returns the label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Expired => "expired",
            Self::Malformed => "malformed",
        }
    }
}

/// Coarse preview state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewState {
    /// A usable preview token is present.
    Active,
    /// Preview mode ends with this request.
    Exit,
    /// No preview token was supplied.
    Absent,
}

impl PreviewState {
    /// Returns the label used in metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Exit => "exit",
            Self::Absent => "absent",
        }
    }
}

/// The resolved preview token.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewToken {
    /// A usable token, forwarded and persisted verbatim.
    Active(String),
    /// Preview mode ends; the cookie is cleared.
    Exit(ExitReason),
    /// Nothing to do.
    #[default]
    Absent,
}

impl PreviewToken {
    /// Returns the coarse state.
    #[must_use]
    pub fn state(&self) -> PreviewState {
        match self {
            Self::Active(_) => PreviewState::Active,
            Self::Exit(_) => PreviewState::Exit,
            Self::Absent => PreviewState::Absent,
        }
    }

    /// Returns the token when active, or `""`.
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Active(token) => token,
            Self::Exit(_) | Self::Absent => "",
        }
    }

    /// Returns `true` if the token is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// Resolves the preview token from the query value and cookie value.
///
/// # Example
///
/// ```
/// use tessera_middleware::resolver::preview::{resolve_preview_token, ExitReason, PreviewToken};
///
/// assert_eq!(
///     resolve_preview_token(Some("exit"), Some("ignored"), 0),
///     PreviewToken::Exit(ExitReason::Requested)
/// );
/// assert_eq!(resolve_preview_token(None, None, 0), PreviewToken::Absent);
/// ```
#[must_use]
pub fn resolve_preview_token(query: Option<&str>, cookie: Option<&str>, now: i64) -> PreviewToken {
    let Some(value) = first_defined([query, cookie]) else {
        return PreviewToken::Absent;
    };

    if value == PREVIEW_EXIT {
        return PreviewToken::Exit(ExitReason::Requested);
    }

    if !is_compact_jws(value) {
        return PreviewToken::Exit(ExitReason::Malformed);
    }

    match expiration(value) {
        None => PreviewToken::Exit(ExitReason::Malformed),
        Some(exp) if exp <= now => PreviewToken::Exit(ExitReason::Expired),
        Some(_) => PreviewToken::Active(value.to_string()),
    }
}

/// Checks for three base64url segments joined by dots, the last one
/// possibly empty.
///
/// Anything else would be forwarded in a header and stored in a cookie.
fn is_compact_jws(value: &str) -> bool {
    let segments: Vec<&str> = value.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return false;
    };

    !header.is_empty()
        && !payload.is_empty()
        && [header, payload, signature].iter().all(|segment| {
            segment
                .bytes()
                .all(|byte| byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_')
        })
}

/// Reads the integer `exp` claim from the payload segment.
fn expiration(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;

    claims.get("exp")?.as_i64()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn preview_token(claims: &str) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"ES256","typ":"JWT"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_exit_request() {
        let resolved = resolve_preview_token(Some(PREVIEW_EXIT), None, NOW);

        assert_eq!(resolved, PreviewToken::Exit(ExitReason::Requested));
        assert_eq!(resolved.state(), PreviewState::Exit);
        assert_eq!(resolved.value(), "");
    }

    #[test]
    fn test_active_token() {
        let token = preview_token(&format!(r#"{{"exp":{}}}"#, NOW + 60));
        let resolved = resolve_preview_token(None, Some(token.as_str()), NOW);

        assert_eq!(resolved.state(), PreviewState::Active);
        assert_eq!(resolved.value(), token);
    }

    #[test]
    fn test_expired_token() {
        let token = preview_token(&format!(r#"{{"exp":{NOW}}}"#));
        assert_eq!(
            resolve_preview_token(Some(token.as_str()), None, NOW),
            PreviewToken::Exit(ExitReason::Expired)
        );
    }

    #[test]
    fn test_malformed_tokens() {
        let values = [
            "garbage".to_string(),
            String::new(),
            "a.!!!.c".to_string(),
            preview_token(r#"{"sub":"x"}"#),
            preview_token(r#"{"exp":"soon"}"#),
            preview_token("not json"),
        ];

        for value in &values {
            assert_eq!(
                resolve_preview_token(Some(value.as_str()), None, NOW),
                PreviewToken::Exit(ExitReason::Malformed),
                "value: {value}"
            );
        }
    }

    #[test]
    fn test_tokens_outside_compact_form_are_malformed() {
        let valid = preview_token(&format!(r#"{{"exp":{}}}"#, NOW + 60));
        let values = [
            format!("{valid}\r\nx-injected: 1"),
            format!("{valid}; Domain=evil.example"),
            format!("{valid}.extra"),
            format!(" {valid}"),
            format!("{valid}=="),
        ];

        for value in &values {
            assert_eq!(
                resolve_preview_token(Some(value.as_str()), None, NOW),
                PreviewToken::Exit(ExitReason::Malformed),
                "value: {value:?}"
            );
        }
    }

    #[test]
    fn test_unsigned_token_is_active() {
        let token = preview_token(&format!(r#"{{"exp":{}}}"#, NOW + 60));
        let (unsigned, _) = token.rsplit_once('.').unwrap();
        let unsigned = format!("{unsigned}.");

        assert!(resolve_preview_token(Some(unsigned.as_str()), None, NOW).is_active());
    }

    #[test]
    fn test_query_wins_over_cookie() {
        let token = preview_token(&format!(r#"{{"exp":{}}}"#, NOW + 60));

        assert_eq!(
            resolve_preview_token(Some(PREVIEW_EXIT), Some(token.as_str()), NOW).state(),
            PreviewState::Exit
        );
        assert_eq!(
            resolve_preview_token(Some(token.as_str()), Some(PREVIEW_EXIT), NOW).state(),
            PreviewState::Active
        );
    }

    #[test]
    fn test_absent() {
        let resolved = resolve_preview_token(None, None, NOW);
        assert_eq!(resolved.state(), PreviewState::Absent);
        assert!(!resolved.is_active());
    }
}
