//! Preferred locale detection.

use http::header::ACCEPT_LANGUAGE;
use tracing::warn;

use crate::handler::LocaleResolver;
use crate::{IdentityError, IdentitySettings, Request};

/// Resolves the preferred locale of a request.
///
/// A non-empty answer from `resolver` wins; otherwise the locale is
/// detected from the request (see [`detect_locale`]).
///
/// # Errors
///
/// Returns `IdentityError::Resolver` if the resolver fails.
pub async fn resolve_locale(
    request: &Request,
    resolver: Option<&dyn LocaleResolver>,
    settings: &IdentitySettings,
) -> Result<String, IdentityError> {
    if let Some(resolver) = resolver {
        let resolved = resolver.resolve(request).await.map_err(|error| {
            warn!(error = %error, "Locale resolver failed");
            IdentityError::resolver("locale", error)
        })?;

        if let Some(locale) = resolved.filter(|locale| !locale.is_empty()) {
            return Ok(locale);
        }
    }

    Ok(detect_locale(request, settings))
}

/// Detects the locale from the request, never failing.
///
/// In order: a leading path segment naming a supported locale, the first
/// `Accept-Language` preference a supported locale satisfies, the default
/// locale, and finally `""`.
#[must_use]
pub fn detect_locale(request: &Request, settings: &IdentitySettings) -> String {
    let supported = &settings.locales;

    path_locale(request.uri().path(), supported)
        .or_else(|| {
            request
                .headers()
                .get(ACCEPT_LANGUAGE)
                .and_then(|value| value.to_str().ok())
                .and_then(|header| accept_language_locale(header, supported))
        })
        .or_else(|| settings.default_locale.clone())
        .unwrap_or_default()
}

fn path_locale(path: &str, supported: &[String]) -> Option<String> {
    let segment = path.trim_start_matches('/').split('/').next()?;

    supported
        .iter()
        .find(|locale| locale.eq_ignore_ascii_case(segment))
        .cloned()
}

fn accept_language_locale(header: &str, supported: &[String]) -> Option<String> {
    let mut preferences: Vec<(&str, f32)> = header
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            let weight = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .map_or(Some(1.0), |q| q.trim().parse::<f32>().ok())?;

            (!tag.is_empty() && tag != "*" && weight > 0.0).then_some((tag, weight))
        })
        .collect();

    // Stable, so equal weights keep header order.
    preferences.sort_by(|a, b| b.1.total_cmp(&a.1));

    preferences.into_iter().find_map(|(tag, _)| {
        supported
            .iter()
            .find(|locale| locale.eq_ignore_ascii_case(tag))
            .or_else(|| {
                supported
                    .iter()
                    .find(|locale| primary_subtag(locale).eq_ignore_ascii_case(primary_subtag(tag)))
            })
            .cloned()
    })
}

fn primary_subtag(tag: &str) -> &str {
    tag.split(['-', '_']).next().unwrap_or(tag)
}
