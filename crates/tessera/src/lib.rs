//! # Tessera
//!
//! **Edge identity layer for web applications**
//!
//! Tessera runs in front of an origin and makes sure every page request knows
//! who the visitor is:
//!
//! - A stable per-browser client ID
//! - A user token that follows login and logout
//! - Preview mode for unpublished content
//! - The visitor's preferred locale and IP address
//!
//! The identity reaches the origin as request headers and is persisted in
//! cookies on the response.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tessera::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // TESSERA__APP_ID, TESSERA__API_KEY, ... or tessera.toml
//!     let identity = tessera::from_env(IdentityOptions::default())?;
//!
//!     let response = Next::new(&identity, origin()).run(request).await;
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/tessera/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod bootstrap;

pub use bootstrap::{from_env, from_loader, log_config, TesseraError, CONFIG_FILE, ENV_PREFIX};

// Re-export identity primitives
pub use tessera_core as core;

// Re-export configuration types
pub use tessera_config as config;

// Re-export route matching types
pub use tessera_matcher as matcher;

// Re-export middleware types
pub use tessera_middleware as middleware;

// Re-export telemetry types
pub use tessera_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use tessera_core::{ApiKey, AppId, ClientId, SubjectReport, Token};

    pub use tessera_config::{ConfigLoader, TesseraConfig};

    pub use tessera_matcher::{Condition, Criterion};

    pub use tessera_middleware::{
        handler_fn, locale_resolver_fn, user_id_resolver_fn, IdentityError, IdentityMiddleware,
        IdentityOptions, IdentitySettings, Middleware, Next, Outcome, Request, RequestContext,
        Response,
    };

    pub use crate::TesseraError;
}
