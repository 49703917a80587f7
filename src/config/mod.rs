use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Placeholder in `DATABASE` replaced by `DATABASE_PASSWORD`
const PASSWORD_PLACEHOLDER: &str = "<PASSWORD>";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub filter: FilterConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    pub url: Option<String>,
    pub password: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: u64,
    pub max_limit: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    /// Token lifetime in seconds
    pub jwt_expires_in: i64,
    pub jwt_cookie_expires_in_days: i64,
    pub secure_cookies: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = lookup("APP_ENV").or_else(|| lookup("NODE_ENV"));
        let environment = match mode.as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        let config = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        }
        .with_overrides(&lookup)?;

        if config.security.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        Ok(config)
    }

    fn with_overrides(mut self, lookup: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Server overrides
        if let Some(v) = lookup("HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Some(v) = lookup("STORE_BACKEND") {
            self.database.backend = match v.as_str() {
                "memory" => StoreBackend::Memory,
                "postgres" => StoreBackend::Postgres,
                _ => return Err(ConfigError::Invalid { key: "STORE_BACKEND", value: v }),
            };
        }
        if let Some(v) = lookup("DATABASE") {
            self.database.url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_PASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Filter overrides
        if let Some(v) = lookup("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }
        if let Some(v) = lookup("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().ok();
        }

        // API overrides
        if let Some(v) = lookup("MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            self.api.log_level = v;
        }

        // Security overrides
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("JWT_EXPIRES_IN") {
            self.security.jwt_expires_in = parse_expiry(&v)
                .ok_or(ConfigError::Invalid { key: "JWT_EXPIRES_IN", value: v })?;
        }
        if let Some(v) = lookup("JWT_COOKIE_EXPIRES_IN") {
            self.security.jwt_cookie_expires_in_days = v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "JWT_COOKIE_EXPIRES_IN", value: v })?;
        }
        if let Some(v) = lookup("CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }

        Ok(self)
    }

    /// Connection string with the password placeholder substituted
    pub fn database_url(&self) -> Result<String, ConfigError> {
        let template = self.database.url.as_deref().ok_or(ConfigError::Missing("DATABASE"))?;

        let connection_string = if template.contains(PASSWORD_PLACEHOLDER) {
            let password = self.database.password.as_deref().ok_or(ConfigError::Missing("DATABASE_PASSWORD"))?;
            template.replace(PASSWORD_PLACEHOLDER, password)
        } else {
            template.to_string()
        };

        url::Url::parse(&connection_string).map_err(|_| ConfigError::InvalidDatabaseUrl)?;
        Ok(connection_string)
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                password: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            filter: FilterConfig {
                default_limit: 100,
                max_limit: Some(1000),
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024, // 10KB
                log_level: "debug".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: "development-only-secret".to_string(),
                jwt_expires_in: 90 * 24 * 60 * 60, // 90 days
                jwt_cookie_expires_in_days: 90,
                secure_cookies: false,
                cors_origins: vec![
                    "https://www.google.com".to_string(),
                    "https://www.wikipedia.org".to_string(),
                ],
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            database: DatabaseConfig {
                backend: StoreBackend::Postgres,
                url: None,
                password: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            filter: FilterConfig {
                default_limit: 100,
                max_limit: Some(1000),
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024, // 10KB
                log_level: "info".to_string(),
            },
            security: SecurityConfig {
                // Must come from JWT_SECRET
                jwt_secret: String::new(),
                jwt_expires_in: 90 * 24 * 60 * 60,
                jwt_cookie_expires_in_days: 90,
                secure_cookies: true,
                cors_origins: vec![
                    "https://www.google.com".to_string(),
                    "https://www.wikipedia.org".to_string(),
                ],
            },
        }
    }
}

/// Parse `90d` / `12h` / `30m` / `45s` / `3600` into seconds
pub fn parse_expiry(value: &str) -> Option<i64> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c),
        _ => (value, 's'),
    };
    let amount: i64 = digits.trim().parse().ok().filter(|n| *n > 0)?;
    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        _ => return None,
    };
    amount.checked_mul(multiplier)
}
