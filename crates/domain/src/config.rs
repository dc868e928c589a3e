//! Environment-driven configuration shared by operator tooling that embeds
//! the admin core.

use std::env;

use thiserror::Error;

/// Key configuration derived from `.env`/process variables so embedding
/// binaries share a deterministic environment contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    database_url: String,
    sysadmin_user_id: i64,
}

impl AppConfig {
    /// Loads configuration by hydrating `.env` (if present) and reading the
    /// required process variables. Missing or malformed entries surface as
    /// `ConfigError` so binaries can respond gracefully.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        let database_url = get_required_var("DATABASE_URL")?;
        let sysadmin_user_id =
            get_required_var("SYSADMIN_USER_ID")?
                .parse()
                .map_err(|source| ConfigError::InvalidNumber {
                    key: "SYSADMIN_USER_ID",
                    source,
                })?;

        Ok(Self {
            database_url,
            sysadmin_user_id,
        })
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Numeric operator id of the one unconditionally authorized sysadmin.
    pub fn sysadmin_user_id(&self) -> i64 {
        self.sysadmin_user_id
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("RATEDESK_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}
