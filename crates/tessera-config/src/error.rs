//! Configuration error types.

use std::path::PathBuf;
use tessera_core::ApiKeyError;
use thiserror::Error;

/// Errors raised while loading or validating the identity configuration.
///
/// Every variant is a configuration error: it is raised when configuration is
/// consumed and is never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No application ID was configured.
    #[error("app_id is required")]
    MissingAppId,

    /// The application ID is not a UUID.
    #[error("app_id must be a UUID, got '{value}'")]
    InvalidAppId {
        /// The configured value.
        value: String,
    },

    /// The API key could not be parsed.
    #[error("invalid api_key: {0}")]
    InvalidApiKey(#[from] ApiKeyError),

    /// Signature enforcement was requested but no key can sign tokens.
    #[error("enforce_signature requires an api_key with a private key")]
    SigningKeyRequired,

    /// A cookie has an empty name or a zero lifetime.
    #[error("invalid cookie setting {field}: {reason}")]
    InvalidCookie {
        /// Dotted path of the offending setting.
        field: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The default fetch timeout is zero.
    #[error("default_fetch_timeout_ms must be positive")]
    ZeroFetchTimeout,

    /// The default locale is missing from the supported locales.
    #[error("default locale '{locale}' is not a supported locale")]
    UnsupportedDefaultLocale {
        /// The configured default.
        locale: String,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Failed to read configuration file.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension or format name is neither TOML nor JSON.
    #[error("unsupported configuration format: {format}")]
    UnsupportedFormat {
        /// The extension or format name.
        format: String,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error.
    #[error("failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A `.env` file exists but could not be loaded.
    #[error("failed to load .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {var}: {reason}")]
    EnvParseError {
        /// The environment variable name.
        var: String,
        /// Explanation of the parsing error.
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid cookie setting error.
    pub fn invalid_cookie(field: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidCookie {
            field: field.into(),
            reason,
        }
    }

    /// Create a new file not found error.
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Create a new environment variable parse error.
    pub fn env_parse_error(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            reason: reason.into(),
        }
    }
}
