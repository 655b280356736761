use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub transfer: TransferConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransferConfig {
    /// Principals allowed to approve or reject transfer requests
    #[serde(default)]
    pub approver_ids: Vec<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file; optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Settings from the environment (with a prefix of STOCKFLOW)
            // E.g. `STOCKFLOW__SERVER__PORT=9090` sets server.port
            .add_source(config::Environment::with_prefix("STOCKFLOW").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
