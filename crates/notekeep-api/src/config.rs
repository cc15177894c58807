//! Server configuration from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/notekeep` |
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `5000` |
//! | `JWT_SECRET` | required |
//! | `ALLOWED_ORIGINS` | `http://localhost:3000` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `STORE` | `postgres` (or `memory`) |
//! | `MAX_BODY_BYTES` | `1048576` |

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::HeaderValue;
use notekeep_core::defaults;
use notekeep_core::{Error, Result};
use notekeep_db::pool::DEFAULT_MAX_CONNECTIONS;

/// Backing store selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    /// Process-local maps; data is lost on restart.
    Memory,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreKind::Postgres),
            "memory" => Ok(StoreKind::Memory),
            other => Err(Error::Config(format!(
                "STORE must be 'postgres' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub allowed_origins: Vec<HeaderValue>,
    pub db_max_connections: u32,
    pub store: StoreKind,
    pub max_body_bytes: usize,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| Error::Config("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| defaults::SERVER_HOST.to_string()),
            port: parse_var(&lookup, "PORT", defaults::SERVER_PORT)?,
            jwt_secret,
            allowed_origins: parse_allowed_origins(
                lookup("ALLOWED_ORIGINS").as_deref().unwrap_or(""),
            ),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            store: match lookup("STORE") {
                Some(raw) => raw.parse()?,
                None => StoreKind::Postgres,
            },
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", defaults::MAX_BODY_BYTES)?,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid HOST/PORT: {}", e)))
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: '{}'", key, raw))),
        None => Ok(default),
    }
}

/// Parse a comma-separated CORS origin whitelist.
///
/// Invalid entries are dropped with a warning; an empty list falls back to
/// the local development origin.
pub fn parse_allowed_origins(raw: &str) -> Vec<HeaderValue> {
    let origins: Vec<HeaderValue> = raw
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect();

    if origins.is_empty() {
        return vec![HeaderValue::from_static(defaults::ALLOWED_ORIGIN)];
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.store, StoreKind::Postgres);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
        assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_missing_secret_is_config_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ServerConfig::from_lookup(lookup_from(&[("JWT_SECRET", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("STORE", "memory"),
            ("DB_MAX_CONNECTIONS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_unknown_store_is_rejected() {
        assert!("mongo".parse::<StoreKind>().is_err());
        assert_eq!("Memory".parse::<StoreKind>().unwrap(), StoreKind::Memory);
    }

    #[test]
    fn test_cors_origins_parsing() {
        let origins = parse_allowed_origins("https://notes.example.com, http://localhost:3000 ,");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://notes.example.com");
        assert_eq!(origins[1], "http://localhost:3000");

        // Control characters are not valid header values.
        let origins = parse_allowed_origins("https://ok.example.com,bad\u{7f}origin");
        assert_eq!(origins.len(), 1);

        assert_eq!(parse_allowed_origins(" "), vec!["http://localhost:3000"]);
    }
}
