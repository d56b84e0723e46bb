//! Ledger state persisted between invocations

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use creator_coin_ledger::{Ledger, LedgerConfig};

use crate::error::Result;

/// JSON file holding the ledger
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the stored ledger, or start a fresh one from `config`
    pub fn load_or_new(&self, config: &LedgerConfig) -> Result<Ledger> {
        if self.exists() {
            debug!("Loading ledger state from {:?}", self.path);
            Ok(Ledger::load(&self.path)?)
        } else {
            info!("No ledger state at {:?}, starting fresh", self.path);
            Ok(Ledger::new(config.clone()))
        }
    }

    /// Write the ledger, replacing the previous state only once the new
    /// file is complete
    pub fn save(&self, ledger: &Ledger) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        ledger.save(&tmp)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved ledger state to {:?}", self.path);
        Ok(())
    }
}
