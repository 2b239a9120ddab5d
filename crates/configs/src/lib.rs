//! Settings for the service and the client console.
//!
//! Loading order: built-in defaults, then `RB_`-prefixed environment
//! variables (a `.env` file is read first when present).
//! Example: `RB_PORT=9000`, `RB_BASE_URL=http://localhost:9000`.

use config::{Config, Environment};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "RB";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for `rusty-board`, the review service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// HS256 signing secret for session tokens
    pub jwt_secret: SecretString,
    pub session_ttl_hours: i64,
    /// Browser origin allowed to call the API with credentials
    pub cors_origin: String,
    /// Mark the session cookie `Secure`. Off for plain-http local setups.
    pub cookie_secure: bool,
}

/// Settings for `rb-client`, the console front end.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl ServerSettings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(env_source())
    }

    fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 5000)?
            .set_default("database_url", "sqlite:rusty_reviews.db")?
            .set_default("session_ttl_hours", 6)?
            .set_default("cors_origin", "http://localhost:3000")?
            .set_default("cookie_secure", false)?
            .add_source(env)
            .build()?
            .try_deserialize()
            .map_err(|e| match e {
                config::ConfigError::NotFound(key) => {
                    ConfigError::Invalid(format!("{}_{} must be set", ENV_PREFIX, key.to_uppercase()))
                }
                other => ConfigError::Load(other),
            })?;

        if settings.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("session_ttl_hours must be positive".into()));
        }
        tracing::debug!(host = %settings.host, port = settings.port, "server settings loaded");
        Ok(settings)
    }
}

impl ClientSettings {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::load_from(env_source())
    }

    fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .set_default("base_url", "http://127.0.0.1:5000")?
            .set_default("request_timeout_secs", 10)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        if settings.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        Ok(settings)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX).try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    #[test]
    fn server_defaults_with_secret() {
        let s = ServerSettings::load_from(env(&[("RB_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(s.port, 5000);
        assert_eq!(s.session_ttl_hours, 6);
        assert!(!s.cookie_secure);
        assert_eq!(s.jwt_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn server_requires_secret() {
        let err = ServerSettings::load_from(env(&[])).unwrap_err();
        assert!(err.to_string().contains("jwt_secret") || err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn env_overrides_defaults() {
        let s = ServerSettings::load_from(env(&[
            ("RB_JWT_SECRET", "x"),
            ("RB_PORT", "9000"),
            ("RB_COOKIE_SECURE", "true"),
        ]))
        .unwrap();
        assert_eq!(s.port, 9000);
        assert!(s.cookie_secure);

        let c = ClientSettings::load_from(env(&[("RB_BASE_URL", "http://reviews.local")])).unwrap();
        assert_eq!(c.base_url, "http://reviews.local");
        assert_eq!(c.request_timeout_secs, 10);
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = ClientSettings::load_from(env(&[("RB_REQUEST_TIMEOUT_SECS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
