//! `has` / `missing` conditions.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::RequestInfo;

/// A condition on a request attribute.
///
/// `value` is an anchored regular expression. Without one, any non-empty
/// value satisfies the condition.
///
/// # Example
///
/// ```
/// use tessera_matcher::Condition;
///
/// let condition: Condition =
///     serde_json::from_str(r#"{"type": "header", "key": "x-beta", "value": "on|yes"}"#).unwrap();
///
/// assert_eq!(condition.value(), Some("on|yes"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Condition {
    /// A request header.
    Header {
        /// Header name.
        key: String,
        /// Pattern the value must match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// A query parameter.
    Query {
        /// Parameter name.
        key: String,
        /// Pattern the value must match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// A request cookie.
    Cookie {
        /// Cookie name.
        key: String,
        /// Pattern the value must match.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
    /// The request host name.
    Host {
        /// Pattern the host must match.
        value: String,
    },
}

impl Condition {
    /// Returns the value pattern, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Header { value, .. } | Self::Query { value, .. } | Self::Cookie { value, .. } => {
                value.as_deref()
            }
            Self::Host { value } => Some(value),
        }
    }

    fn read<'a>(&self, info: &'a RequestInfo) -> Option<&'a str> {
        match self {
            Self::Header { key, .. } => info.header(key),
            Self::Query { key, .. } => info.query(key),
            Self::Cookie { key, .. } => info.cookie(key),
            Self::Host { .. } => info.host(),
        }
    }
}

/// A condition with its value pattern compiled.
#[derive(Debug, Clone)]
pub(crate) struct CompiledCondition {
    condition: Condition,
    pattern: Option<Regex>,
}

impl CompiledCondition {
    /// Compiles the condition, returning the regex error message on failure.
    pub(crate) fn compile(condition: &Condition) -> Result<Self, String> {
        let pattern = condition
            .value()
            .filter(|value| !value.is_empty())
            .map(|value| Regex::new(&format!("^(?:{value})$")).map_err(|e| e.to_string()))
            .transpose()?;

        Ok(Self {
            condition: condition.clone(),
            pattern,
        })
    }

    /// Returns `true` if the request satisfies the condition.
    ///
    /// `missing` conditions hold exactly when this returns `false`.
    pub(crate) fn is_satisfied(&self, info: &RequestInfo) -> bool {
        match (self.condition.read(info), &self.pattern) {
            (None, _) => false,
            (Some(value), Some(pattern)) => pattern.is_match(value),
            (Some(value), None) => !value.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    fn info() -> RequestInfo {
        let request = Request::builder()
            .uri("https://beta.example.com/?variant=b&empty=")
            .header("x-beta", "on")
            .header("cookie", "segment=vip")
            .body(())
            .unwrap();
        RequestInfo::from_request(&request)
    }

    fn satisfied(json: &str) -> bool {
        let condition: Condition = serde_json::from_str(json).unwrap();
        CompiledCondition::compile(&condition)
            .unwrap()
            .is_satisfied(&info())
    }

    #[test]
    fn test_presence_without_value() {
        assert!(satisfied(r#"{"type": "header", "key": "x-beta"}"#));
        assert!(!satisfied(r#"{"type": "header", "key": "x-other"}"#));
        assert!(!satisfied(r#"{"type": "query", "key": "empty"}"#));
    }

    #[test]
    fn test_value_is_anchored() {
        assert!(satisfied(r#"{"type": "query", "key": "variant", "value": "a|b"}"#));
        assert!(!satisfied(r#"{"type": "query", "key": "variant", "value": "bb"}"#));
        assert!(!satisfied(r#"{"type": "cookie", "key": "segment", "value": "vi"}"#));
        assert!(satisfied(r#"{"type": "cookie", "key": "segment", "value": "vi."}"#));
    }

    #[test]
    fn test_host_condition() {
        assert!(satisfied(r#"{"type": "host", "value": "beta\\.example\\.com"}"#));
        assert!(!satisfied(r#"{"type": "host", "value": "example\\.com"}"#));
    }

    #[test]
    fn test_host_requires_value() {
        let result: Result<Condition, _> = serde_json::from_str(r#"{"type": "host"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_value_pattern() {
        let condition = Condition::Header {
            key: "x".to_string(),
            value: Some("(".to_string()),
        };
        assert!(CompiledCondition::compile(&condition).is_err());
    }
}
