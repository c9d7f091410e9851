//! Service configuration, read from the environment (and `.env` via dotenvy
//! in `main`).

use crate::domain::TransitionPolicy;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is not a valid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Postgres connection string. Without one the service keeps orders in memory.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub port: u16,
    pub transition_policy: TransitionPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self { database_url: None, max_connections: 10, port: 8080, transition_policy: TransitionPolicy::Permissive }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            database_url: var("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections),
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            transition_policy: parse(&var, "ORDER_TRANSITION_POLICY")?.unwrap_or(defaults.transition_policy),
        })
    }
}

fn parse<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>, ConfigError> {
    var(name).map(|value| value.trim().parse().map_err(|_| ConfigError::Invalid { name, value })).transpose()
}
