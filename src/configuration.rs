use std::collections::HashMap;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub tokens: TokenSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Token signing settings
#[derive(serde::Deserialize, Clone)]
pub struct TokenSettings {
    pub access_token_secret: String,
    #[serde(default)]
    pub refresh_token_secret: String,
    pub access_token_expiry: i64,          // seconds (default 15)
    #[serde(default)]
    pub refresh_token_expiry: Option<i64>, // seconds; none = revoked instead of expiring
    pub issuer: String,
    pub refresh_enabled: bool,
    pub refresh_revocable: bool,
}

impl TokenSettings {
    /// Check the invariants startup relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "tokens.access_token_secret".to_string(),
            ));
        }
        if self.refresh_enabled && self.refresh_token_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired(
                "tokens.refresh_token_secret".to_string(),
            ));
        }
        if self.refresh_enabled && self.access_token_secret == self.refresh_token_secret {
            return Err(ConfigError::InvalidValue(
                "access and refresh token secrets must differ".to_string(),
            ));
        }
        if self.access_token_expiry <= 0 {
            return Err(ConfigError::InvalidValue(
                "tokens.access_token_expiry must be positive".to_string(),
            ));
        }
        if matches!(self.refresh_token_expiry, Some(expiry) if expiry <= 0) {
            return Err(ConfigError::InvalidValue(
                "tokens.refresh_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Identity provider settings
#[derive(serde::Deserialize, Clone, Default)]
pub struct AuthSettings {
    /// username -> bcrypt hash; empty accepts any valid username
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tokens.validate()
    }
}

/// Read settings from an optional `configuration` file and `APP_*` env vars.
///
/// Nested keys use `__`, e.g. `APP_TOKENS__ACCESS_TOKEN_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("tokens.access_token_expiry", 15)?
        .set_default("tokens.issuer", "token-gateway")?
        .set_default("tokens.refresh_enabled", true)?
        .set_default("tokens.refresh_revocable", true)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
