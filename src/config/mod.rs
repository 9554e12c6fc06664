use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while assembling configuration at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("Invalid MongoDB database name: {0}")]
    InvalidDatabaseName(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in every auth mode; larger ones get 413
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: String,
    pub name: String,
    pub connect_timeout_ms: u64,
    pub server_selection_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub auth_disabled: bool,
    pub client_secret: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source, then validate it.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::defaults().with_overrides(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn with_overrides<F>(mut self, lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("FRIES_REST_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("FRIES_REST_PORT") {
            self.server.port = parse_number("FRIES_REST_PORT", &v)?;
        }
        if let Some(v) = lookup("FRIES_REST_MAX_BODY_BYTES") {
            self.server.max_body_bytes = parse_number("FRIES_REST_MAX_BODY_BYTES", &v)?;
        }

        // Database overrides
        if let Some(v) = lookup("FRIES_REST_STORE") {
            self.database.backend = match v.trim().to_ascii_lowercase().as_str() {
                "mongo" | "mongodb" => StoreBackend::Mongo,
                "memory" => StoreBackend::Memory,
                _ => return Err(ConfigError::Invalid { name: "FRIES_REST_STORE", value: v }),
            };
        }
        if let Some(v) = lookup("FRIES_REST_MONGO_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("FRIES_REST_MONGO_DB") {
            self.database.name = v;
        }
        if let Some(v) = lookup("FRIES_REST_MONGO_CONNECT_TIMEOUT_MS") {
            self.database.connect_timeout_ms = parse_number("FRIES_REST_MONGO_CONNECT_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("FRIES_REST_MONGO_SELECTION_TIMEOUT_MS") {
            self.database.server_selection_timeout_ms =
                parse_number("FRIES_REST_MONGO_SELECTION_TIMEOUT_MS", &v)?;
        }

        // Security overrides
        if let Some(v) = lookup("FRIES_REST_DISABLE_AUTH") {
            self.security.auth_disabled = parse_flag("FRIES_REST_DISABLE_AUTH", &v)?;
        }
        if let Some(v) = lookup("FRIES_REST_CLIENT_SECRET") {
            self.security.client_secret = Some(v);
        }

        Ok(self)
    }

    fn defaults() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                max_body_bytes: 1024 * 1024, // 1MiB
            },
            database: DatabaseConfig {
                backend: StoreBackend::Mongo,
                url: String::new(),
                name: String::new(),
                connect_timeout_ms: 5000,
                server_selection_timeout_ms: 5000,
            },
            security: SecurityConfig {
                auth_disabled: false,
                client_secret: None,
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == StoreBackend::Mongo {
            if self.database.url.trim().is_empty() {
                return Err(ConfigError::Missing("FRIES_REST_MONGO_URL"));
            }
            if self.database.name.is_empty() {
                return Err(ConfigError::Missing("FRIES_REST_MONGO_DB"));
            }
            if !is_valid_db_name(&self.database.name) {
                return Err(ConfigError::InvalidDatabaseName(self.database.name.clone()));
            }
        }

        let has_secret = self
            .security
            .client_secret
            .as_deref()
            .is_some_and(|s| !s.is_empty());
        if !self.security.auth_disabled && !has_secret {
            return Err(ConfigError::Missing("FRIES_REST_CLIENT_SECRET"));
        }

        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
        }),
    }
}

/// MongoDB database names: non-empty, under 64 bytes, none of `/\. "$*<>:|?`
fn is_valid_db_name(name: &str) -> bool {
    const FORBIDDEN: &[char] = &['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?', '\0'];
    !name.is_empty() && name.len() < 64 && !name.contains(FORBIDDEN)
}
