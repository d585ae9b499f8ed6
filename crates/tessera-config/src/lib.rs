//! Typed configuration for the Tessera identity layer.
//!
//! This crate provides a strongly-typed configuration with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use tessera_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tessera_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("tessera.toml")?
//!     .with_env_prefix("TESSERA")
//!     .load()?;
//!
//! println!("Issuing tokens for application {}", config.app_id);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! app_id = "7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a"
//! api_key = "00000000-0000-0000-0000-000000000000:ES256;MIGHAgEAMBMGByqGSM49..."
//! enforce_signature = true
//! default_fetch_timeout_ms = 2000
//!
//! [cookies.client_id]
//! name = "ct.client_id"
//! duration_secs = 31536000
//! domain = "example.com"
//!
//! [cookies.user_token]
//! duration_secs = 604800
//!
//! [locales]
//! supported = ["en", "pt-br"]
//! default = "en"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Values can be overridden via environment variables using the format
//! `PREFIX__SECTION__KEY`:
//!
//! - `TESSERA__APP_ID=7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a`
//! - `TESSERA__COOKIES__USER_TOKEN__DURATION=3600`
//! - `TESSERA__LOGGING__FORMAT=pretty`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::*;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
