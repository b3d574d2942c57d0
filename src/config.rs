use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// JSON catalog imported into the database at startup.
    pub catalog_path: Option<String>,
    /// Decimal places of prices in API responses.
    pub price_decimals: u32,
    /// Currency reported when a tier carries none.
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let catalog_path = env_map
            .get("CATALOG_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let price_decimals = env_map
            .get("PRICE_DECIMALS")
            .map(|s| s.as_str())
            .unwrap_or("2")
            .parse::<u32>()
            .ok()
            .filter(|dp| *dp <= 10)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PRICE_DECIMALS".to_string(),
                    "must be an integer between 0 and 10".to_string(),
                )
            })?;

        let currency = match env_map.get("CURRENCY").map(|s| s.trim()) {
            None => "EUR".to_string(),
            Some(code) if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                code.to_ascii_uppercase()
            }
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "CURRENCY".to_string(),
                    format!("must be a three-letter code, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            catalog_path,
            price_decimals,
            currency,
        })
    }
}
