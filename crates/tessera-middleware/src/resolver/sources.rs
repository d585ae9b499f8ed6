//! Precedence rules for values that can arrive through several carriers.
//!
//! Each carrier yields an `Option`, listed in priority order. The merge
//! functions here are pure so the precedence can be tested on its own.

use tessera_core::Token;

/// Returns the first defined value.
///
/// An empty string counts as defined.
///
/// ```
/// use tessera_middleware::resolver::sources::first_defined;
///
/// assert_eq!(first_defined([None, Some("cookie")]), Some("cookie"));
/// assert_eq!(first_defined([Some("query"), Some("cookie")]), Some("query"));
/// assert_eq!(first_defined::<&str>([None, None]), None);
/// ```
pub fn first_defined<T>(sources: impl IntoIterator<Item = Option<T>>) -> Option<T> {
    sources.into_iter().flatten().next()
}

/// Returns the most recently issued token.
///
/// Tokens are compared by issue time; on a tie the earlier source wins.
pub fn newest_token(sources: impl IntoIterator<Item = Option<Token>>) -> Option<Token> {
    sources
        .into_iter()
        .flatten()
        .fold(None, |newest, candidate| match newest {
            Some(current) if !candidate.is_newer_than(&current) => Some(current),
            _ => Some(candidate),
        })
}
