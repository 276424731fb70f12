//! Runtime settings.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML file
//! (`config/hardstore.toml` unless another path is given), then environment
//! variables prefixed with `HARDSTORE_`, using `__` between nested keys
//! (`HARDSTORE_DATABASE__PATH=/var/lib/hardstore.db`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "config/hardstore.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub catalog: CatalogSettings,
    /// Default `env_logger` filter; `RUST_LOG` still wins when set
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub pool_size: u32,
    /// How long a connection waits on SQLite's write lock before giving up
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Re-check the whole tree inside every structural write before committing
    pub verify_on_write: bool,
    /// Seed the default hardware categories into an empty store
    pub seed_defaults: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseSettings {
                path: PathBuf::from("data/hardstore.db"),
                pool_size: 8,
                busy_timeout_ms: 5_000,
            },
            catalog: CatalogSettings {
                verify_on_write: true,
                seed_defaults: true,
            },
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Loads settings layering `path` (if present) and the environment over the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Config::try_from(&Settings::default())
            .context("Failed to build default configuration")?;

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("HARDSTORE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?
            .try_deserialize()
            .context("Invalid configuration")
    }
}
