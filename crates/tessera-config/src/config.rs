//! Main configuration type.
//!
//! This module provides the top-level [`TesseraConfig`] struct and its builder.

use serde::{Deserialize, Serialize};
use tessera_core::{ApiKey, AppId};

use crate::{ConfigError, CookieSettings, CookiesConfig, LocaleConfig, LogFormat, LoggingConfig};

/// Complete identity layer configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use tessera_config::TesseraConfig;
///
/// let config = TesseraConfig::builder()
///     .app_id("7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a")
///     .build();
///
/// assert!(config.validate().is_ok());
/// assert!(!config.signature_required());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Application ID tokens are issued for (UUID).
    #[serde(default)]
    pub app_id: String,

    /// API key, `identifier[:privateKey]`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Whether user tokens must be signed by the configured key.
    ///
    /// When unset, enforcement is enabled exactly when the API key carries a
    /// private key.
    #[serde(default)]
    pub enforce_signature: Option<bool>,

    /// Identity cookies.
    #[serde(default)]
    pub cookies: CookiesConfig,

    /// Default timeout for content fetches made with the resolved context.
    #[serde(default)]
    pub default_fetch_timeout_ms: Option<u64>,

    /// Locale detection.
    #[serde(default)]
    pub locales: LocaleConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TesseraConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub fn builder() -> TesseraConfigBuilder {
        TesseraConfigBuilder::new()
    }

    /// Parses the configured API key, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiKey` if the key is malformed.
    pub fn parsed_api_key(&self) -> Result<Option<ApiKey>, ConfigError> {
        Ok(self.api_key.as_deref().map(ApiKey::parse).transpose()?)
    }

    /// Parses the application ID.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingAppId` when unset and
    /// `ConfigError::InvalidAppId` when it is not a UUID.
    pub fn parsed_app_id(&self) -> Result<AppId, ConfigError> {
        if self.app_id.is_empty() {
            return Err(ConfigError::MissingAppId);
        }

        AppId::parse(&self.app_id).ok_or_else(|| ConfigError::InvalidAppId {
            value: self.app_id.clone(),
        })
    }

    /// Returns the effective signature enforcement.
    ///
    /// An explicit setting wins. Otherwise enforcement follows whether the API
    /// key carries a private key; malformed keys count as having none.
    #[must_use]
    pub fn signature_required(&self) -> bool {
        self.enforce_signature.unwrap_or_else(|| {
            self.parsed_api_key()
                .ok()
                .flatten()
                .is_some_and(|key| key.has_private_key())
        })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The application ID is missing or not a UUID
    /// - The API key cannot be parsed
    /// - Signature enforcement is enabled without a private key
    /// - A cookie duration or the fetch timeout is zero
    /// - A cookie name is empty
    /// - The default locale is not among the supported locales
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parsed_app_id()?;

        let api_key = self.parsed_api_key()?;

        if self.enforce_signature == Some(true)
            && !api_key.as_ref().is_some_and(ApiKey::has_private_key)
        {
            return Err(ConfigError::SigningKeyRequired);
        }

        validate_cookie("cookies.client_id", &self.cookies.client_id)?;
        validate_cookie("cookies.user_token", &self.cookies.user_token)?;
        validate_cookie("cookies.preview_token", &self.cookies.preview_token)?;

        if self.default_fetch_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroFetchTimeout);
        }

        if let Some(default) = &self.locales.default {
            if !self.locales.supported.is_empty() && !self.locales.supported.contains(default) {
                return Err(ConfigError::UnsupportedDefaultLocale {
                    locale: default.clone(),
                });
            }
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// Pretty, debug-level logs and no signature enforcement.
    ///
    /// # Example
    ///
    /// ```
    /// use tessera_config::TesseraConfig;
    ///
    /// let config = TesseraConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config.enforce_signature = Some(false);

        config
    }

    /// Create a production configuration preset.
    ///
    /// JSON, info-level logs; signature enforcement follows the API key.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = LogFormat::Json;

        config
    }
}

fn validate_cookie(section: &str, settings: &CookieSettings) -> Result<(), ConfigError> {
    if settings.name.as_deref() == Some("") {
        return Err(ConfigError::invalid_cookie(
            format!("{section}.name"),
            "must not be empty",
        ));
    }

    if settings.duration_secs == Some(0) {
        return Err(ConfigError::invalid_cookie(
            format!("{section}.duration_secs"),
            "must be positive",
        ));
    }

    Ok(())
}

/// Builder for [`TesseraConfig`].
#[derive(Debug, Default)]
pub struct TesseraConfigBuilder {
    config: TesseraConfig,
}

impl TesseraConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application ID.
    #[must_use]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.config.app_id = app_id.into();
        self
    }

    /// Set the API key.
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.api_key = Some(api_key.into());
        self
    }

    /// Set signature enforcement explicitly.
    #[must_use]
    pub fn enforce_signature(mut self, enforce: bool) -> Self {
        self.config.enforce_signature = Some(enforce);
        self
    }

    /// Set the cookies section.
    #[must_use]
    pub fn cookies(mut self, cookies: CookiesConfig) -> Self {
        self.config.cookies = cookies;
        self
    }

    /// Set the default fetch timeout.
    #[must_use]
    pub fn default_fetch_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.default_fetch_timeout_ms = Some(timeout_ms);
        self
    }

    /// Set the locales section.
    #[must_use]
    pub fn locales(mut self, locales: LocaleConfig) -> Self {
        self.config.locales = locales;
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> TesseraConfig {
        self.config
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<TesseraConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
