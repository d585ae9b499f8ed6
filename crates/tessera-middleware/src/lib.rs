//! # Tessera Middleware
//!
//! Edge identity resolution for the Tessera identity layer.
//!
//! The [`IdentityMiddleware`] runs in front of an origin. For each request it
//! resolves who the visitor is and tells the origin through request headers,
//! then persists that identity in cookies on the response.
//!
//! ## Resolved Identity
//!
//! | Header                 | Value                                         |
//! |------------------------|-----------------------------------------------|
//! | `x-client-id`          | Stable per-browser UUID                       |
//! | `x-user-token`         | JWT-like token naming the user or anonymous   |
//! | `x-request-uri`        | Absolute URL without the preview parameter    |
//! | `x-preferred-locale`   | Locale chosen by a resolver or detected       |
//! | `x-client-ip`          | Forwarded client address, when known          |
//! | `x-preview-token`      | Active preview token, when in preview mode    |
//!
//! ## Example
//!
//! ```rust,ignore
//! use tessera_core::AppId;
//! use tessera_middleware::{IdentityMiddleware, IdentitySettings};
//!
//! let settings = IdentitySettings::new(AppId::parse("00000000-0000-0000-0000-000000000001")?);
//! let middleware = IdentityMiddleware::new(settings)?;
//!
//! let outcome = middleware.handle(request).await?;
//! ```
//!
//! Static assets and framework internals are passed through untouched; see
//! [`exclusion`].

#![doc(html_root_url = "https://docs.rs/tessera-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod clock;
pub mod context;
pub mod cookies;
pub mod error;
pub mod exclusion;
pub mod handler;
pub mod headers;
pub mod identity;
pub mod middleware;
pub mod outcome;
pub mod resolver;
pub mod settings;
pub mod types;

// Re-export main types at crate root
pub use clock::{Clock, FrozenClock, SystemClock};
pub use context::RequestContext;
pub use error::{BoxError, IdentityError};
pub use handler::{
    handler_fn, locale_resolver_fn, user_id_resolver_fn, Handler, LocaleResolver, UserIdResolver,
};
pub use identity::{IdentityMiddleware, IdentityOptions};
pub use middleware::{BoxFuture, Middleware, Next};
pub use outcome::{augment, Continue, Outcome};
pub use settings::{CookieSpec, IdentitySettings};
pub use types::{Request, Response, ResponseExt};
