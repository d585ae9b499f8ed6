//! Immutable runtime settings.

use tessera_config::{
    ConfigError, CookieSettings, TesseraConfig, DEFAULT_CLIENT_ID_COOKIE,
    DEFAULT_CLIENT_ID_DURATION_SECS, DEFAULT_PREVIEW_TOKEN_COOKIE, DEFAULT_USER_TOKEN_COOKIE,
    DEFAULT_USER_TOKEN_DURATION_SECS,
};
use tessera_core::{ApiKey, AppId};

use crate::IdentityError;

/// Name, lifetime and domain of an identity cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieSpec {
    /// Cookie name.
    pub name: String,
    /// `Max-Age` in seconds; `None` writes a session cookie.
    pub max_age_secs: Option<u64>,
    /// `Domain` attribute.
    pub domain: Option<String>,
}

impl CookieSpec {
    /// Creates a host-only cookie spec.
    #[must_use]
    pub fn new(name: impl Into<String>, max_age_secs: Option<u64>) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
            domain: None,
        }
    }

    fn from_config(settings: &CookieSettings, name: &str, max_age_secs: Option<u64>) -> Self {
        Self {
            name: settings.name_or(name).to_string(),
            max_age_secs: settings.duration_secs.or(max_age_secs),
            domain: settings.domain.clone(),
        }
    }
}

/// Settings shared by every request the middleware handles.
///
/// # Example
///
/// ```
/// use tessera_core::AppId;
/// use tessera_middleware::IdentitySettings;
///
/// let app_id = AppId::parse("7e9d59a9-e4b3-45d4-b1c7-48287f1e5e8a").unwrap();
/// let settings = IdentitySettings::new(app_id).with_locales(["en", "pt-br"], Some("en"));
///
/// assert_eq!(settings.client_id_cookie.name, "ct.client_id");
/// assert_eq!(settings.token_duration_secs(), 604_800);
/// assert!(!settings.enforce_signature);
/// ```
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Application tokens are issued for.
    pub app_id: AppId,
    /// Key that signs issued tokens.
    pub api_key: Option<ApiKey>,
    /// Whether user tokens must be signed by `api_key`.
    pub enforce_signature: bool,
    /// Client ID cookie.
    pub client_id_cookie: CookieSpec,
    /// User token cookie; its lifetime also bounds issued tokens.
    pub user_token_cookie: CookieSpec,
    /// Preview token cookie.
    pub preview_token_cookie: CookieSpec,
    /// Locales the application serves.
    pub locales: Vec<String>,
    /// Locale used when none is detected.
    pub default_locale: Option<String>,
}

impl IdentitySettings {
    /// Creates settings with default cookies, no key and no locales.
    #[must_use]
    pub fn new(app_id: AppId) -> Self {
        Self {
            app_id,
            api_key: None,
            enforce_signature: false,
            client_id_cookie: CookieSpec::new(
                DEFAULT_CLIENT_ID_COOKIE,
                Some(DEFAULT_CLIENT_ID_DURATION_SECS),
            ),
            user_token_cookie: CookieSpec::new(
                DEFAULT_USER_TOKEN_COOKIE,
                Some(DEFAULT_USER_TOKEN_DURATION_SECS),
            ),
            preview_token_cookie: CookieSpec::new(DEFAULT_PREVIEW_TOKEN_COOKIE, None),
            locales: Vec::new(),
            default_locale: None,
        }
    }

    /// Sets the API key. Enforcement follows whether it can sign.
    #[must_use]
    pub fn with_api_key(mut self, api_key: ApiKey) -> Self {
        self.enforce_signature = api_key.has_private_key();
        self.api_key = Some(api_key);
        self
    }

    /// Overrides signature enforcement.
    #[must_use]
    pub fn with_signature_enforcement(mut self, enforce: bool) -> Self {
        self.enforce_signature = enforce;
        self
    }

    /// Sets the supported locales and the fallback locale.
    #[must_use]
    pub fn with_locales<I, S>(mut self, locales: I, default: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self.default_locale = default.map(str::to_string);
        self
    }

    /// Converts a configuration into runtime settings.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Config` if the configuration does not validate.
    pub fn from_config(config: &TesseraConfig) -> Result<Self, IdentityError> {
        config.validate()?;

        let app_id = config.parsed_app_id()?;

        let settings = Self {
            app_id,
            api_key: config.parsed_api_key()?,
            enforce_signature: config.signature_required(),
            client_id_cookie: CookieSpec::from_config(
                &config.cookies.client_id,
                DEFAULT_CLIENT_ID_COOKIE,
                Some(DEFAULT_CLIENT_ID_DURATION_SECS),
            ),
            user_token_cookie: CookieSpec::from_config(
                &config.cookies.user_token,
                DEFAULT_USER_TOKEN_COOKIE,
                Some(DEFAULT_USER_TOKEN_DURATION_SECS),
            ),
            preview_token_cookie: CookieSpec::from_config(
                &config.cookies.preview_token,
                DEFAULT_PREVIEW_TOKEN_COOKIE,
                None,
            ),
            locales: config.locales.supported.clone(),
            default_locale: config.locales.default.clone(),
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Checks invariants of hand-built settings.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MissingSigningKey` if enforcement is enabled
    /// without a private key, or `IdentityError::Config` for empty cookie
    /// names and zero lifetimes on the client ID and user token cookies.
    pub fn validate(&self) -> Result<(), IdentityError> {
        if self.enforce_signature && self.signing_key().is_none() {
            return Err(IdentityError::MissingSigningKey);
        }

        for (field, spec) in [
            ("cookies.client_id", &self.client_id_cookie),
            ("cookies.user_token", &self.user_token_cookie),
            ("cookies.preview_token", &self.preview_token_cookie),
        ] {
            if spec.name.is_empty() {
                return Err(ConfigError::invalid_cookie(field, "must not be empty").into());
            }
        }

        for (field, spec) in [
            ("cookies.client_id.duration_secs", &self.client_id_cookie),
            ("cookies.user_token.duration_secs", &self.user_token_cookie),
        ] {
            if spec.max_age_secs == Some(0) {
                return Err(ConfigError::invalid_cookie(field, "must be positive").into());
            }
        }

        Ok(())
    }

    /// Returns the key used to sign issued tokens, if it can sign.
    #[must_use]
    pub fn signing_key(&self) -> Option<&ApiKey> {
        self.api_key.as_ref().filter(|key| key.has_private_key())
    }

    /// Returns the lifetime of issued user tokens in seconds.
    #[must_use]
    pub fn token_duration_secs(&self) -> i64 {
        self.user_token_cookie
            .max_age_secs
            .unwrap_or(DEFAULT_USER_TOKEN_DURATION_SECS)
            .try_into()
            .unwrap_or(i64::MAX)
    }
}
