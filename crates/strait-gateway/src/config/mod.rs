//! Configuration types for the Strait gateway.

mod forward;
mod listen;
mod routes;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use forward::{ConnectionPoolConfig, ForwardConfig};
pub use listen::{ListenConfig, MetricsConfig};
pub use routes::{default_route_table, RouteRule};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Ordered route table. Earlier rules win; order is part of the contract
    /// (`openrouter/api` must sit above `openrouter`).
    #[serde(default = "default_route_table")]
    pub routes: Vec<RouteRule>,

    #[serde(default)]
    pub forward: ForwardConfig,
    #[serde(default)]
    pub connection_pool: ConnectionPoolConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: ListenConfig::default(),
            metrics: MetricsConfig::default(),
            routes: default_route_table(),
            forward: ForwardConfig::default(),
            connection_pool: ConnectionPoolConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.routes.is_empty() {
            anyhow::bail!(
                "Route table is empty. Define at least one entry under 'routes', \
                 or omit the key to use the built-in provider table"
            );
        }

        for rule in &self.routes {
            rule.validate().map_err(|e| anyhow::anyhow!(e))?;
        }

        if self.forward.timeout_ms == 0 {
            anyhow::bail!("'forward.timeout_ms' must be greater than zero");
        }

        Ok(())
    }
}
