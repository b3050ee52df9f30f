use thiserror::Error;

use crate::game::BoundsPolicy;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Grid policy of rooms created without an explicit one
    pub bounds_policy: BoundsPolicy,
    /// PostgreSQL is used when set, in-memory storage otherwise
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            bounds_policy: BoundsPolicy::default(),
            database_url: None,
        }
    }
}

impl ServerConfig {
    /// Reads `MIXMO_BIND_ADDR`, `MIXMO_BOUNDS_POLICY` and `DATABASE_URL`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("MIXMO_BIND_ADDR")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(defaults.bind_addr);

        let bounds_policy = match lookup("MIXMO_BOUNDS_POLICY") {
            Some(value) => value
                .parse::<BoundsPolicy>()
                .map_err(|reason| ConfigError::InvalidValue {
                    name: "MIXMO_BOUNDS_POLICY",
                    reason,
                })?,
            None => defaults.bounds_policy,
        };

        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr,
            bounds_policy,
            database_url,
        })
    }
}
