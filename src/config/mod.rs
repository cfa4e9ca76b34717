//! Application configuration loaded from environment.

use std::net::SocketAddr;

const MIN_JWT_SECRET_LEN: usize = 32;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    /// PostgreSQL connection URL. Without it users live in memory.
    pub database_url: Option<String>,
    /// JWT signing secret (min 32 chars).
    pub jwt_secret: String,
    /// Access token lifetime in hours.
    pub jwt_ttl_hours: i64,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_addr = lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigLoadError::InvalidServerAddr)?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let jwt_secret = lookup("JWT_SECRET")
            .unwrap_or_else(|| "authgate_jwt_secret_change_in_production_32chars".to_string());
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigLoadError::JwtSecretTooShort(MIN_JWT_SECRET_LEN));
        }

        let jwt_ttl_hours = match lookup("JWT_TTL_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or(ConfigLoadError::InvalidJwtTtl)?,
            None => 24,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        Ok(Self {
            server_addr,
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            log_level,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Invalid SERVER_ADDR")]
    InvalidServerAddr,
    #[error("JWT_SECRET must be at least {0} characters")]
    JwtSecretTooShort(usize),
    #[error("JWT_TTL_HOURS must be a positive integer")]
    InvalidJwtTtl,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigLoadError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server_addr.port(), 3000);
        assert!(config.database_url.is_none());
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("DATABASE_URL", "postgres://localhost/auth"),
            ("JWT_TTL_HOURS", "2"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(config.server_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/auth")
        );
        assert_eq!(config.jwt_ttl_hours, 2);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn blank_database_url_means_memory() {
        let config = load(&[("DATABASE_URL", "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("SERVER_ADDR", "not-an-addr")]),
            Err(ConfigLoadError::InvalidServerAddr)
        ));
        assert!(matches!(
            load(&[("JWT_SECRET", "short")]),
            Err(ConfigLoadError::JwtSecretTooShort(32))
        ));
        assert!(matches!(
            load(&[("JWT_TTL_HOURS", "0")]),
            Err(ConfigLoadError::InvalidJwtTtl)
        ));
        assert!(matches!(
            load(&[("JWT_TTL_HOURS", "soon")]),
            Err(ConfigLoadError::InvalidJwtTtl)
        ));
    }
}
