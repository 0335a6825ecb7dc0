//! Layered configuration: defaults, then an optional TOML file, then
//! `LAYER_LEDGER_*` environment variables. Command-line flags are applied on
//! top by the caller.

use anyhow::Result;
use config::{Config, File as ConfigFile};
use layer_ledger_registry::registry::DEFAULT_MAX_CHAIN_DEPTH;
use layer_ledger_registry::DEFAULT_TREE;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "layer-ledger.toml";
pub const ENV_PREFIX: &str = "LAYER_LEDGER";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the sled ledger.
    pub data_dir: PathBuf,
    /// Sled tree the layers live in.
    pub tree: String,
    pub max_chain_depth: usize,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("layer-ledger"))
        .unwrap_or_else(|| PathBuf::from(".layer-ledger"))
}

impl AppConfig {
    pub fn load(config_path_override: Option<&Path>) -> Result<Self> {
        let data_dir = default_data_dir();
        let resolved_path = if let Some(path) = config_path_override {
            if !path.exists() {
                anyhow::bail!(
                    "Configuration file {} not found (specified via --config)",
                    path.display()
                );
            }
            Some(path.to_path_buf())
        } else {
            let path = data_dir.join(CONFIG_FILE_NAME);
            path.exists().then_some(path)
        };

        let mut builder = Config::builder()
            .set_default("data_dir", data_dir.to_string_lossy().into_owned())?
            .set_default("tree", DEFAULT_TREE)?
            .set_default("max_chain_depth", DEFAULT_MAX_CHAIN_DEPTH as u64)?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?;

        if let Some(path) = &resolved_path {
            builder = builder.add_source(ConfigFile::from(path.as_path()));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        if config.max_chain_depth == 0 {
            anyhow::bail!("max_chain_depth must be at least 1");
        }
        Ok(config)
    }
}
