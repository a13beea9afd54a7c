//! Configuration utilities re-exported at the crate root.
//!
//! This exposes [`SchemaConfig`] and [`GeneratorConfig`] so applications can
//! load settings from `config/config.toml` or environment variables using
//! `SchemaConfig::load()` / `GeneratorConfig::load()`.

pub use crate::generators::GeneratorConfig;
pub use crate::schema::{CqlFeature, PartitionRangeConfig, Replication, SchemaConfig};

use config::{Config, ConfigError, Environment, File};
use serde::de::DeserializeOwned;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "CQL_TWIN";

/// Load `section` from `config/config.toml`, falling back to env vars.
///
/// Environment variables use the `CQL_TWIN` prefix and `__` as the section
/// separator, e.g. `CQL_TWIN__SCHEMA__MAX_TABLES=3`. A missing section
/// yields `T::default()`.
pub(crate) fn load_section<T: DeserializeOwned + Default>(section: &str) -> Result<T, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let settings = match builder.build() {
        Ok(cfg) => cfg,
        Err(err) => {
            if std::path::Path::new(CONFIG_FILE).exists() {
                log::warn!(
                    "failed to load config file, falling back to env. Error: {}",
                    err
                );
            }
            Config::builder()
                .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
                .build()
                .map_err(|env_err| {
                    ConfigError::Message(format!(
                        "Failed to load configuration from file and env: {}, then env-only error: {}",
                        err, env_err
                    ))
                })?
        }
    };

    match settings.get::<T>(section) {
        Ok(cfg) => Ok(cfg),
        Err(ConfigError::NotFound(_)) => Ok(T::default()),
        Err(e) => Err(ConfigError::Message(format!(
            "{section} configuration could not be loaded from file or environment: {}",
            e
        ))),
    }
}

impl SchemaConfig {
    /// Load the `schema` section; see [`load_section`]
    pub fn load() -> Result<Self, ConfigError> {
        load_section("schema")
    }
}

impl GeneratorConfig {
    /// Load the `generator` section; see [`load_section`]
    pub fn load() -> Result<Self, ConfigError> {
        load_section("generator")
    }
}
