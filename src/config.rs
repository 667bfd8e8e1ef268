//! Process configuration from environment variables.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    /// Shared secret the payment bridge presents on settlement callbacks.
    pub payment_callback_secret: String,
    pub nats_url: Option<String>,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 8083;
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    pub const DEFAULT_ISSUER: &'static str = "miga-shop";

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            port: parse_or(get("PORT"), "PORT", Self::DEFAULT_PORT)?,
            database_max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| Self::DEFAULT_ISSUER.to_string()),
            payment_callback_secret: required("PAYMENT_CALLBACK_SECRET")?,
            nats_url: get("NATS_URL"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { name, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/miga"),
            ("JWT_SECRET", "s"),
            ("PAYMENT_CALLBACK_SECRET", "cb"),
        ])).unwrap();
        assert_eq!(cfg.port, 8083);
        assert_eq!(cfg.database_max_connections, 10);
        assert_eq!(cfg.jwt_issuer, "miga-shop");
        assert_eq!(cfg.payment_callback_secret, "cb");
        assert!(cfg.nats_url.is_none());
    }

    #[test]
    fn test_missing_and_invalid() {
        assert_eq!(Config::from_lookup(lookup(&[("JWT_SECRET", "s")])).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        assert_eq!(
            Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("JWT_SECRET", "s"), ("PAYMENT_CALLBACK_SECRET", "cb"), ("PORT", "http")])).unwrap_err(),
            ConfigError::Invalid { name: "PORT", value: "http".into() }
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("JWT_SECRET", " ")])).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("JWT_SECRET", "s")])).unwrap_err(),
            ConfigError::Missing("PAYMENT_CALLBACK_SECRET")
        );
    }
}
