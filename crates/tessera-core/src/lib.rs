//! # Tessera Core
//!
//! Identity primitives for the Tessera edge identity layer.
//!
//! - [`Token`] - immutable, optionally signed user-session token
//! - [`ApiKey`] - application credential, optionally able to sign tokens
//! - [`ClientId`] - stable per-browser anonymous identifier
//! - [`SubjectReport`] - what an external user-id resolver says about the caller
//! - [`Cookies`] / [`SetCookie`] - cookie jar parsing and `Set-Cookie` building

#![doc(html_root_url = "https://docs.rs/tessera-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod api_key;
pub mod cookie;
mod error;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;
pub mod identity;
pub mod token;

pub use api_key::ApiKey;
pub use cookie::{Cookies, SameSite, SetCookie};
pub use error::{ApiKeyError, TokenError};
pub use identity::{AppId, ClientId, SubjectReport};
pub use token::Token;
