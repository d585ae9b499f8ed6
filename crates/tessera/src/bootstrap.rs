//! Process startup: configuration, telemetry and the identity middleware.

use tessera_config::{ConfigError, ConfigLoader, LogFormat, LoggingConfig};
use tessera_middleware::{IdentityError, IdentityMiddleware, IdentityOptions};
use tessera_telemetry::{init_telemetry, LogConfig, TelemetryConfig, TelemetryError};
use thiserror::Error;
use tracing::info;

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "TESSERA";

/// Configuration file read from the working directory, when present.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Startup errors.
#[derive(Debug, Error)]
pub enum TesseraError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Logging or metrics could not be initialized.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// The middleware rejected the configuration.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Builds the middleware from `.env`, [`CONFIG_FILE`] and `TESSERA__*`
/// variables, initializing logging and metrics on the way.
///
/// Call once per process; telemetry can only be installed once.
pub fn from_env(options: IdentityOptions) -> Result<IdentityMiddleware, TesseraError> {
    let config = ConfigLoader::new()
        .with_dotenv()?
        .with_optional_file(CONFIG_FILE)?
        .with_env_prefix(ENV_PREFIX)
        .load()?;

    init_telemetry(&TelemetryConfig {
        logging: log_config(&config.logging),
        ..TelemetryConfig::default()
    })?;

    info!(
        app_id = %config.app_id,
        signed = config.signature_required(),
        "Starting Tessera identity middleware"
    );

    Ok(IdentityMiddleware::from_config(&config, options)?)
}

/// Builds the middleware from a prepared loader without touching telemetry.
pub fn from_loader(
    loader: ConfigLoader,
    options: IdentityOptions,
) -> Result<IdentityMiddleware, TesseraError> {
    let config = loader.load()?;
    Ok(IdentityMiddleware::from_config(&config, options)?)
}

/// Maps the logging section of the configuration to a logging setup.
#[must_use]
pub fn log_config(logging: &LoggingConfig) -> LogConfig {
    let base = match logging.format {
        LogFormat::Json => LogConfig::production(),
        LogFormat::Pretty => LogConfig::development(),
    };
    base.with_level(logging.level.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::Full;
    use tessera_core::fixtures::{self, APP_ID};

    #[test]
    fn test_log_config_follows_format() {
        let pretty = log_config(&LoggingConfig {
            level: "debug".to_string(),
            format: LogFormat::Pretty,
        });
        assert!(!pretty.json_format);
        assert_eq!(pretty.level, "debug");

        let json = log_config(&LoggingConfig::default());
        assert!(json.json_format);
    }

    #[test]
    fn test_from_loader() {
        let toml = format!(
            r#"
            app_id = "{APP_ID}"

            [cookies.client_id]
            name = "visitor"
            "#
        );

        let middleware = from_loader(
            ConfigLoader::new().with_string(&toml, "toml").unwrap(),
            IdentityOptions::default(),
        )
        .unwrap();

        let settings = middleware.settings();
        assert_eq!(settings.app_id.as_str(), APP_ID);
        assert_eq!(settings.client_id_cookie.name, "visitor");
        assert!(!settings.enforce_signature);
    }

    #[test]
    fn test_from_loader_enforces_signing_keys() {
        let toml = format!(
            r#"
            app_id = "{APP_ID}"
            api_key = "{}"
            "#,
            fixtures::api_key_string()
        );

        let middleware = from_loader(
            ConfigLoader::new().with_string(&toml, "toml").unwrap(),
            IdentityOptions::default(),
        )
        .unwrap();
        assert!(middleware.settings().enforce_signature);
    }

    #[test]
    fn test_from_loader_rejects_invalid_config() {
        let error = from_loader(
            ConfigLoader::new()
                .with_string(r#"app_id = "not-a-uuid""#, "toml")
                .unwrap(),
            IdentityOptions::default(),
        )
        .unwrap_err();

        assert!(matches!(error, TesseraError::Config(_)));
    }

    #[tokio::test]
    async fn test_loaded_middleware_handles_requests() {
        let toml = format!(r#"app_id = "{APP_ID}""#);
        let middleware = from_loader(
            ConfigLoader::new().with_string(&toml, "toml").unwrap(),
            IdentityOptions::default(),
        )
        .unwrap();

        let request = http::Request::builder()
            .uri("/")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let outcome = middleware.handle(request).await.unwrap();
        assert!(outcome.is_continue());
    }
}
