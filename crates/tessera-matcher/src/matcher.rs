//! Route criteria and the compiled matcher.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::condition::CompiledCondition;
use crate::{Condition, MatcherError, MatcherResult, RequestInfo, SourcePattern};

/// A declarative route criterion.
///
/// A request matches the criterion when its path matches `source` (any path
/// when unset), every `has` condition holds and no `missing` condition holds.
///
/// Criteria deserialize either from a bare source string or from an object:
///
/// ```
/// use tessera_matcher::Criterion;
///
/// let criteria: Vec<Criterion> = serde_json::from_str(r#"[
///     "/api/:path*",
///     {"source": "/shop", "locale": false, "has": [{"type": "cookie", "key": "vip"}]}
/// ]"#).unwrap();
///
/// assert_eq!(criteria[0].source.as_deref(), Some("/api/:path*"));
/// assert_eq!(criteria[1].locale, Some(false));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "CriterionRepr")]
pub struct Criterion {
    /// Path pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Set to `false` to disable the optional locale prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<bool>,

    /// Conditions that must all hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub has: Vec<Condition>,

    /// Conditions that must all fail.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<Condition>,
}

impl Criterion {
    /// Creates a criterion matching a source pattern.
    #[must_use]
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// Adds a condition that must hold.
    #[must_use]
    pub fn has(mut self, condition: Condition) -> Self {
        self.has.push(condition);
        self
    }

    /// Adds a condition that must not hold.
    #[must_use]
    pub fn missing(mut self, condition: Condition) -> Self {
        self.missing.push(condition);
        self
    }

    /// Disables the optional locale prefix.
    #[must_use]
    pub fn without_locale(mut self) -> Self {
        self.locale = Some(false);
        self
    }
}

impl From<&str> for Criterion {
    fn from(source: &str) -> Self {
        Self::source(source)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CriterionRepr {
    Source(String),
    Full(CriterionFields),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CriterionFields {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    locale: Option<bool>,
    #[serde(default)]
    has: Vec<Condition>,
    #[serde(default)]
    missing: Vec<Condition>,
}

impl From<CriterionRepr> for Criterion {
    fn from(repr: CriterionRepr) -> Self {
        match repr {
            CriterionRepr::Source(source) => Self::source(source),
            CriterionRepr::Full(fields) => Self {
                source: fields.source,
                locale: fields.locale,
                has: fields.has,
                missing: fields.missing,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledCriterion {
    source: Option<SourcePattern>,
    has: Vec<CompiledCondition>,
    missing: Vec<CompiledCondition>,
}

impl CompiledCriterion {
    fn matches(&self, info: &RequestInfo) -> bool {
        self.source
            .as_ref()
            .map_or(true, |source| source.is_match(info.path()))
            && self.has.iter().all(|c| c.is_satisfied(info))
            && !self.missing.iter().any(|c| c.is_satisfied(info))
    }
}

/// A compiled set of route criteria.
///
/// A request is accepted when any criterion matches; an empty set accepts
/// every request.
///
/// # Example
///
/// ```
/// use tessera_matcher::{Criterion, RequestInfo, RouteMatcher};
///
/// let matcher = RouteMatcher::compile(&[Criterion::source("/api/foo")], &[]).unwrap();
///
/// let request = http::Request::builder().uri("/api/foo").body(()).unwrap();
/// assert!(matcher.matches(&RequestInfo::from_request(&request)));
///
/// let request = http::Request::builder().uri("/foo").body(()).unwrap();
/// assert!(!matcher.matches(&RequestInfo::from_request(&request)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteMatcher {
    criteria: Vec<CompiledCriterion>,
}

impl RouteMatcher {
    /// Returns a matcher accepting every request.
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    /// Compiles route criteria.
    ///
    /// `locales` enables an optional leading locale segment on every source
    /// whose criterion does not set `locale: false`.
    ///
    /// # Errors
    ///
    /// Returns `MatcherError` naming the first criterion whose source or
    /// condition pattern fails to compile.
    pub fn compile(criteria: &[Criterion], locales: &[String]) -> MatcherResult<Self> {
        let criteria = criteria
            .iter()
            .enumerate()
            .map(|(index, criterion)| compile_criterion(index, criterion, locales))
            .collect::<MatcherResult<Vec<_>>>()?;

        debug!(criteria = criteria.len(), "Compiled route matcher");

        Ok(Self { criteria })
    }

    /// Returns `true` if the request is accepted.
    #[must_use]
    pub fn matches(&self, info: &RequestInfo) -> bool {
        self.criteria.is_empty() || self.criteria.iter().any(|c| c.matches(info))
    }

    /// Returns the number of criteria.
    #[must_use]
    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Returns `true` if the matcher accepts every request.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}

fn compile_criterion(
    index: usize,
    criterion: &Criterion,
    locales: &[String],
) -> MatcherResult<CompiledCriterion> {
    let locales: &[String] = if criterion.locale == Some(false) {
        &[]
    } else {
        locales
    };

    let source = criterion
        .source
        .as_deref()
        .map(|source| {
            SourcePattern::compile(source, locales)
                .map_err(|reason| MatcherError::invalid_source(index, source, reason))
        })
        .transpose()?;

    let compile_conditions = |conditions: &[Condition]| {
        conditions
            .iter()
            .map(|condition| {
                CompiledCondition::compile(condition).map_err(|reason| {
                    MatcherError::invalid_condition(
                        index,
                        condition.value().unwrap_or_default(),
                        reason,
                    )
                })
            })
            .collect::<MatcherResult<Vec<_>>>()
    };

    Ok(CompiledCriterion {
        source,
        has: compile_conditions(&criterion.has)?,
        missing: compile_conditions(&criterion.missing)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn info(uri: &str) -> RequestInfo {
        RequestInfo::from_request(&Request::builder().uri(uri).body(()).unwrap())
    }

    fn info_with_header(uri: &str, name: &str, value: &str) -> RequestInfo {
        RequestInfo::from_request(
            &Request::builder()
                .uri(uri)
                .header(name, value)
                .body(())
                .unwrap(),
        )
    }

    #[test]
    fn test_empty_matcher_accepts_everything() {
        let matcher = RouteMatcher::compile(&[], &[]).unwrap();
        assert!(matcher.is_empty());
        assert!(matcher.matches(&info("/anything")));
        assert!(RouteMatcher::always().matches(&info("/")));
    }

    #[test]
    fn test_any_criterion_matches() {
        let matcher = RouteMatcher::compile(
            &[Criterion::source("/api/:path*"), Criterion::source("/account")],
            &[],
        )
        .unwrap();

        assert_eq!(matcher.len(), 2);
        assert!(matcher.matches(&info("/api/users")));
        assert!(matcher.matches(&info("/account")));
        assert!(!matcher.matches(&info("/about")));
    }

    #[test]
    fn test_has_and_missing_conditions() {
        let criterion = Criterion::source("/shop")
            .has(Condition::Header {
                key: "x-beta".to_string(),
                value: None,
            })
            .missing(Condition::Query {
                key: "legacy".to_string(),
                value: Some("1".to_string()),
            });

        let matcher = RouteMatcher::compile(&[criterion], &[]).unwrap();

        assert!(!matcher.matches(&info("/shop")));
        assert!(matcher.matches(&info_with_header("/shop", "x-beta", "1")));
        assert!(!matcher.matches(&info_with_header("/shop?legacy=1", "x-beta", "1")));
        assert!(matcher.matches(&info_with_header("/shop?legacy=0", "x-beta", "1")));
    }

    #[test]
    fn test_conditions_without_source() {
        let criterion = Criterion::default().has(Condition::Cookie {
            key: "preview".to_string(),
            value: None,
        });

        let matcher = RouteMatcher::compile(&[criterion], &[]).unwrap();
        assert!(matcher.matches(&info_with_header("/x", "cookie", "preview=1")));
        assert!(!matcher.matches(&info("/x")));
    }

    #[test]
    fn test_locale_prefix_can_be_disabled() {
        let locales = vec!["en".to_string()];
        let matcher = RouteMatcher::compile(&[Criterion::source("/about")], &locales).unwrap();
        assert!(matcher.matches(&info("/en/about")));

        let matcher =
            RouteMatcher::compile(&[Criterion::source("/about").without_locale()], &locales)
                .unwrap();
        assert!(!matcher.matches(&info("/en/about")));
        assert!(matcher.matches(&info("/about")));
    }

    #[test]
    fn test_invalid_source_names_criterion_and_pattern() {
        let err = RouteMatcher::compile(
            &[Criterion::source("/ok"), Criterion::source("/broken/(")],
            &[],
        )
        .unwrap_err();

        assert!(matches!(err, MatcherError::InvalidSource { index: 1, .. }));
        assert_eq!(err.pattern(), "/broken/(");
    }

    #[test]
    fn test_invalid_condition_names_pattern() {
        let criterion = Criterion::source("/ok").has(Condition::Host {
            value: "[".to_string(),
        });

        let err = RouteMatcher::compile(&[criterion], &[]).unwrap_err();
        assert!(matches!(err, MatcherError::InvalidCondition { index: 0, .. }));
        assert!(err.to_string().contains("'['"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        let result: Result<Criterion, _> = serde_json::from_str(r#"{"path": "/x"}"#);
        assert!(result.is_err());
    }
}
