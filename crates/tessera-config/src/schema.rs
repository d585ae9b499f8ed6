//! Configuration schema types.
//!
//! This module defines the structure of every configuration section.

use serde::{Deserialize, Serialize};

/// Default name of the client ID cookie.
pub const DEFAULT_CLIENT_ID_COOKIE: &str = "ct.client_id";

/// Default lifetime of the client ID cookie (one year).
pub const DEFAULT_CLIENT_ID_DURATION_SECS: u64 = 31_536_000;

/// Default name of the user token cookie.
pub const DEFAULT_USER_TOKEN_COOKIE: &str = "ct.user_token";

/// Default lifetime of the user token cookie and of issued tokens (one week).
pub const DEFAULT_USER_TOKEN_DURATION_SECS: u64 = 604_800;

/// Default name of the preview token cookie.
pub const DEFAULT_PREVIEW_TOKEN_COOKIE: &str = "ct.preview_token";

/// Settings of a single identity cookie.
///
/// Unset fields fall back to the defaults of the cookie they configure.
///
/// # Example
///
/// ```
/// use tessera_config::CookieSettings;
///
/// let settings: CookieSettings = toml::from_str(r#"
///     name = "cid"
///     domain = "example.com"
/// "#).unwrap();
///
/// assert_eq!(settings.name.as_deref(), Some("cid"));
/// assert_eq!(settings.duration_secs, None);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CookieSettings {
    /// Cookie name.
    #[serde(default)]
    pub name: Option<String>,

    /// Cookie lifetime (`Max-Age`) in seconds.
    #[serde(default)]
    pub duration_secs: Option<u64>,

    /// Cookie `Domain` attribute.
    #[serde(default)]
    pub domain: Option<String>,
}

impl CookieSettings {
    /// Returns the configured name, or `default` when unset.
    #[must_use]
    pub fn name_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.name.as_deref().unwrap_or(default)
    }
}

/// Identity cookies section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct CookiesConfig {
    /// Client ID cookie.
    #[serde(default)]
    pub client_id: CookieSettings,

    /// User token cookie. Its duration also bounds issued tokens.
    #[serde(default)]
    pub user_token: CookieSettings,

    /// Preview token cookie. Without a duration it is a session cookie.
    #[serde(default)]
    pub preview_token: CookieSettings,
}

/// Locale detection section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct LocaleConfig {
    /// Locales the application serves (e.g., `en-us`, `pt-br`).
    #[serde(default)]
    pub supported: Vec<String>,

    /// Locale used when none can be detected.
    #[serde(default)]
    pub default: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_settings_defaults() {
        let settings = CookieSettings::default();
        assert_eq!(settings.name_or(DEFAULT_CLIENT_ID_COOKIE), "ct.client_id");
        assert!(settings.duration_secs.is_none());
        assert!(settings.domain.is_none());
    }

    #[test]
    fn test_cookie_settings_reject_unknown_fields() {
        let result: Result<CookieSettings, _> = toml::from_str("max_age = 10");
        assert!(result.is_err());
    }

    #[test]
    fn test_cookies_config_partial_section() {
        let config: CookiesConfig = toml::from_str(
            r#"
            [user_token]
            duration_secs = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.user_token.duration_secs, Some(3600));
        assert_eq!(config.client_id, CookieSettings::default());
    }

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_deserialize() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_locale_config_deserialize() {
        let config: LocaleConfig =
            serde_json::from_str(r#"{"supported": ["en", "pt-br"], "default": "en"}"#).unwrap();

        assert_eq!(config.supported, vec!["en", "pt-br"]);
        assert_eq!(config.default.as_deref(), Some("en"));
    }
}
