//! Declarative route matching for Tessera.
//!
//! A [`RouteMatcher`] compiles a list of [`Criterion`] values once, at setup
//! time, into a predicate over a normalized [`RequestInfo`] view:
//!
//! - `source` - a path pattern (`/api/:path*`, `/post/:id(\d+)`, ...)
//! - `has` / `missing` - header, query, cookie and host [`Condition`]s
//! - `locale` - whether an optional leading locale segment is accepted
//!
//! # Example
//!
//! ```
//! use tessera_matcher::{Condition, Criterion, RequestInfo, RouteMatcher};
//!
//! let matcher = RouteMatcher::compile(
//!     &[Criterion::source("/api/:path*").missing(Condition::Header {
//!         key: "x-internal".to_string(),
//!         value: None,
//!     })],
//!     &[],
//! )
//! .unwrap();
//!
//! let request = http::Request::builder().uri("/api/users").body(()).unwrap();
//! assert!(matcher.matches(&RequestInfo::from_request(&request)));
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-matcher/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod condition;
mod error;
mod matcher;
mod pattern;
mod request_info;

pub use condition::Condition;
pub use error::{MatcherError, MatcherResult};
pub use matcher::{Criterion, RouteMatcher};
pub use pattern::SourcePattern;
pub use request_info::RequestInfo;
