//! Configuration (spec §6.1): environment-driven settings, loaded via
//! `config` + `dotenv` the way `icn-mesh-jobs/src/main.rs` loads its own
//! `AppConfig`. A missing required variable is a startup failure (exit
//! code 2, spec §6.2), not a silently-defaulted value.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub mesos_master: String,
    #[serde(default)]
    pub mesos_authenticate: bool,
    #[serde(default)]
    pub mesos_principal: Option<String>,
    #[serde(default)]
    pub mesos_secret: Option<String>,
    pub registry_endpoint: String,
    pub disks_endpoint: String,
    #[serde(default = "default_framework_name")]
    pub framework_name: String,
    pub executor_command: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_listen_addr")]
    pub http_listen_addr: String,
    #[serde(default = "default_cluster_root")]
    pub cluster_root: String,
}

fn default_framework_name() -> String {
    "cluster-scheduler".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_listen_addr() -> String {
    "0.0.0.0:5001".to_string()
}

/// Conventional root the admission API's `<id>`-keyed routes resolve
/// short ids against, via `registry::dn_from_id` (spec §6's `dn_from(id)`
/// "reverse lookup within a conventional root").
fn default_cluster_root() -> String {
    "instances".to_string()
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

impl Settings {
    /// Load settings from a `.env` file (if present) then the process
    /// environment, case-insensitively, without a prefix.
    pub fn load() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        let cfg = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .separator("__"),
            )
            .build()?;
        Ok(cfg.try_deserialize()?)
    }
}
