//! Configuration System
//!
//! Layered configuration: built-in defaults, then an optional
//! `bale.toml` in the workspace, then `BALE_`-prefixed environment
//! variables. Validated before use.

use crate::error::TreeError;
use crate::logging::LoggingConfig;
use crate::manifest::node::TableFormat;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BaleConfig {
    /// Object/manifest store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Object store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store root directory
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    /// Wire tag of the format assigned to newly published tables
    #[serde(default = "default_format")]
    pub default_format: String,
}

fn default_store_root() -> PathBuf {
    directories::ProjectDirs::from("io", "bale", "bale")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".bale"))
}

fn default_format() -> String {
    TableFormat::default().as_str().to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_store_root(),
            default_format: default_format(),
        }
    }
}

impl StoreConfig {
    /// The parsed default table format.
    pub fn format(&self) -> Result<TableFormat, TreeError> {
        Ok(TableFormat::parse(&self.default_format)?)
    }
}

impl BaleConfig {
    /// Load configuration for a workspace.
    ///
    /// Precedence, lowest to highest: defaults, `{workspace}/bale.toml`
    /// (when present), `BALE_*` environment variables
    /// (e.g. `BALE_STORE__ROOT`).
    pub fn load(workspace_root: Option<&Path>) -> Result<Self, TreeError> {
        let mut builder = Config::builder();

        if let Some(root) = workspace_root {
            let file = root.join("bale.toml");
            if file.exists() {
                if let Some(path) = file.to_str() {
                    builder = builder.add_source(File::with_name(path).required(false));
                }
            }
        }

        builder = builder.add_source(Environment::with_prefix("BALE").separator("__"));

        let loaded: BaleConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Validate the entire configuration.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.store.root.as_os_str().is_empty() {
            return Err(TreeError::Config("store root cannot be empty".to_string()));
        }
        self.store.format()?;
        Ok(())
    }

    /// Write this configuration as `bale.toml` under the workspace root.
    pub fn write(&self, workspace_root: &Path) -> Result<PathBuf, TreeError> {
        let rendered = toml::to_string_pretty(self)
            .map_err(|e| TreeError::Config(format!("failed to render config: {}", e)))?;
        let path = workspace_root.join("bale.toml");
        std::fs::write(&path, rendered)?;
        Ok(path)
    }
}
