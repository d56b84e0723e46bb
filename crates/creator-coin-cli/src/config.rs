//! CLI configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use creator_coin_ledger::LedgerConfig;

use crate::error::Result;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "CCOIN_CONFIG";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where the ledger state is persisted between invocations
    pub state_path: PathBuf,

    /// Settings for a freshly created ledger
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_path: Self::default_state_path(),
            ledger: LedgerConfig::default(),
        }
    }
}

impl CliConfig {
    fn default_state_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ccoin")
            .join("state.json")
    }

    /// Default config file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ccoin")
            .join("config.toml")
    }

    /// Config path from the command line, then `CCOIN_CONFIG`, then the
    /// platform default
    pub fn resolve_path(explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .unwrap_or_else(Self::default_path)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load the config at `path`, writing the default there first if the
    /// file does not exist
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        config.save(path)?;
        info!("Created default config at {:?}", path);
        Ok(config)
    }
}
