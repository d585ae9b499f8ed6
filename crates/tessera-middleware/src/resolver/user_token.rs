//! User token reconciliation.
//!
//! The current token is kept only while it is still acceptable for this
//! application, clock and signing policy, and while its subject agrees with
//! what the user-id resolver reports. Otherwise a new token is issued; tokens
//! are never modified in place.

use std::fmt;

use tessera_core::{Cookies, SubjectReport, Token};
use tracing::{debug, warn};
use uuid::Uuid;

use super::sources::newest_token;
use crate::handler::UserIdResolver;
use crate::headers::USER_TOKEN_HEADER;
use crate::{IdentityError, IdentitySettings, Request};

/// Why the current user token was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReissueReason {
    /// No parseable token was supplied.
    Missing,
    /// The token belongs to another application.
    ForeignApplication,
    /// The token is expired or not yet valid.
    OutsideValidityWindow,
    /// Signatures are enforced and the token is unsigned.
    Unsigned,
    /// Signatures are enforced and the token was signed by another key.
    KeyMismatch,
    /// The resolver reports a different subject.
    SubjectChanged,
}

impl ReissueReason {
    /// Returns the label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::ForeignApplication => "foreign_application",
            Self::OutsideValidityWindow => "outside_validity_window",
            Self::Unsigned => "unsigned",
            Self::KeyMismatch => "key_mismatch",
            Self::SubjectChanged => "subject_changed",
        }
    }
}

impl fmt::Display for ReissueReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The token to use for a request and whether it was just issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    /// The token to forward and persist.
    pub token: Token,
    /// Set when `token` replaces the supplied one.
    pub reissued: Option<ReissueReason>,
}

/// Reads the token candidates of a request, in priority order.
///
/// The user token cookie comes first, then the `x-user-token` header set by
/// an upstream proxy. Unparseable values are dropped.
#[must_use]
pub fn token_candidates(request: &Request, settings: &IdentitySettings) -> [Option<Token>; 2] {
    let cookies = Cookies::from_headers(request.headers());

    let cookie = cookies
        .get(&settings.user_token_cookie.name)
        .and_then(|value| Token::parse(value).ok());

    let header = request
        .headers()
        .get(USER_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Token::parse(value).ok());

    [cookie, header]
}

/// Returns why `token` cannot be kept, or `None` if it is acceptable.
#[must_use]
pub fn assess(
    token: &Token,
    report: &SubjectReport,
    now: i64,
    settings: &IdentitySettings,
) -> Option<ReissueReason> {
    if token.application_id() != Some(settings.app_id.as_str()) {
        return Some(ReissueReason::ForeignApplication);
    }

    if !token.is_valid_now(now) {
        return Some(ReissueReason::OutsideValidityWindow);
    }

    if settings.enforce_signature {
        if !token.is_signed() {
            return Some(ReissueReason::Unsigned);
        }

        if !settings
            .api_key
            .as_ref()
            .is_some_and(|key| token.matches_key_id(key))
        {
            return Some(ReissueReason::KeyMismatch);
        }
    }

    match report.subject() {
        Some(subject) if token.subject() != subject => Some(ReissueReason::SubjectChanged),
        _ => None,
    }
}

/// Issues a token for `subject`, signed when enforcement is enabled.
///
/// # Errors
///
/// Returns `IdentityError::MissingSigningKey` if enforcement is enabled
/// without a private key, or `IdentityError::Signing` if signing fails.
pub fn issue_token(
    subject: Option<&str>,
    now: i64,
    settings: &IdentitySettings,
) -> Result<Token, IdentityError> {
    let token = Token::issue(settings.app_id.as_str(), subject, now)
        .with_duration(settings.token_duration_secs());

    if !settings.enforce_signature {
        return Ok(token);
    }

    let key = settings
        .signing_key()
        .ok_or(IdentityError::MissingSigningKey)?;

    Ok(token
        .with_token_id(Uuid::new_v4().to_string())
        .signed_with(key)?)
}

/// Keeps `current` if acceptable, otherwise issues a replacement.
///
/// The replacement is issued for the reported subject. Without a
/// determined report the subject of `current` carries over, and a missing
/// token yields an anonymous one.
///
/// # Errors
///
/// Propagates the errors of [`issue_token`].
pub fn reconcile(
    current: Option<Token>,
    report: &SubjectReport,
    now: i64,
    settings: &IdentitySettings,
) -> Result<Reconciliation, IdentityError> {
    let reason = match current.as_ref() {
        None => ReissueReason::Missing,
        Some(token) => match assess(token, report, now, settings) {
            Some(reason) => reason,
            None => {
                return Ok(Reconciliation {
                    token: token.clone(),
                    reissued: None,
                })
            }
        },
    };

    let subject = report
        .subject()
        .unwrap_or_else(|| current.as_ref().and_then(Token::subject));

    Ok(Reconciliation {
        token: issue_token(subject, now, settings)?,
        reissued: Some(reason),
    })
}

/// Resolves the user token of a request.
///
/// The user-id resolver, when supplied, is awaited before reconciling.
///
/// # Errors
///
/// Returns `IdentityError::Resolver` if the resolver fails, and the errors of
/// [`issue_token`] when a replacement cannot be issued.
pub async fn resolve_user_token(
    request: &Request,
    resolver: Option<&dyn UserIdResolver>,
    now: i64,
    settings: &IdentitySettings,
) -> Result<Token, IdentityError> {
    let current = newest_token(token_candidates(request, settings));

    let report = match resolver {
        Some(resolver) => resolver.resolve(request).await.map_err(|error| {
            warn!(error = %error, "User ID resolver failed");
            IdentityError::resolver("user id", error)
        })?,
        None => SubjectReport::Undetermined,
    };

    let reconciliation = reconcile(current, &report, now, settings)?;

    if let Some(reason) = reconciliation.reissued {
        debug!(
            reason = reason.as_str(),
            anonymous = reconciliation.token.is_anonymous(),
            signed = reconciliation.token.is_signed(),
            "Issued new user token"
        );
        tessera_telemetry::metrics::record_user_token_reissued(reason.as_str());
    }

    Ok(reconciliation.token)
}
