//! Matcher error types.

use thiserror::Error;

/// Result type for matcher construction.
pub type MatcherResult<T> = Result<T, MatcherError>;

/// Errors raised while compiling route criteria.
///
/// Construction errors are fatal at setup time; each one names the
/// criterion (by position) and the offending pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    /// A `source` path pattern could not be compiled.
    #[error("invalid source pattern '{pattern}' in criterion #{index}: {reason}")]
    InvalidSource {
        /// Position of the criterion.
        index: usize,
        /// The offending pattern.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// A `has`/`missing` condition value could not be compiled.
    #[error("invalid condition pattern '{pattern}' in criterion #{index}: {reason}")]
    InvalidCondition {
        /// Position of the criterion.
        index: usize,
        /// The offending pattern.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },
}

impl MatcherError {
    /// Create a new invalid source error.
    pub fn invalid_source(
        index: usize,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSource {
            index,
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid condition error.
    pub fn invalid_condition(
        index: usize,
        pattern: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidCondition {
            index,
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Returns the pattern that failed to compile.
    #[must_use]
    pub fn pattern(&self) -> &str {
        match self {
            Self::InvalidSource { pattern, .. } | Self::InvalidCondition { pattern, .. } => pattern,
        }
    }
}
