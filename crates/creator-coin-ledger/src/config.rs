//! Ledger configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use creator_coin_core::{
    creator_coin_init_code_hash, ChainId, Hash256, DEFAULT_DECIMALS, PERMIT_DOMAIN_NAME,
    PERMIT_DOMAIN_VERSION,
};

use crate::error::Result;

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Chain id bound into every permit domain
    pub chain_id: ChainId,

    /// Block timestamp of a fresh ledger (seconds)
    pub genesis_timestamp: u64,

    /// Decimals for coins deployed without an explicit value
    pub default_decimals: u8,

    /// EIP-712 domain name shared by all coins
    pub permit_domain_name: String,

    /// EIP-712 domain version
    pub permit_domain_version: String,

    /// Overrides the built-in coin init code hash, for matching addresses
    /// produced by an existing deployment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_init_code_hash: Option<Hash256>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            chain_id: ChainId::HARDHAT,
            genesis_timestamp: 0,
            default_decimals: DEFAULT_DECIMALS,
            permit_domain_name: PERMIT_DOMAIN_NAME.to_string(),
            permit_domain_version: PERMIT_DOMAIN_VERSION.to_string(),
            token_init_code_hash: None,
        }
    }
}

impl LedgerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings baked into a factory at deployment
    pub fn factory_options(&self) -> FactoryOptions {
        FactoryOptions {
            chain_id: self.chain_id,
            init_code_hash: self
                .token_init_code_hash
                .unwrap_or_else(creator_coin_init_code_hash),
            default_decimals: self.default_decimals,
            permit_domain_name: self.permit_domain_name.clone(),
            permit_domain_version: self.permit_domain_version.clone(),
        }
    }
}

/// Immutable settings of one factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryOptions {
    pub chain_id: ChainId,
    pub init_code_hash: Hash256,
    pub default_decimals: u8,
    pub permit_domain_name: String,
    pub permit_domain_version: String,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        LedgerConfig::default().factory_options()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = LedgerConfig::from_toml_str("chain_id = 1\n").unwrap();
        assert_eq!(config.chain_id, ChainId::MAINNET);
        assert_eq!(config.default_decimals, 6);
        assert_eq!(config.permit_domain_name, "rally-cc");
        assert!(config.token_init_code_hash.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        let config = LedgerConfig {
            genesis_timestamp: 1_700_000_000,
            token_init_code_hash: Some(Hash256::new([7u8; 32])),
            ..LedgerConfig::default()
        };
        config.save(&path).unwrap();
        assert_eq!(LedgerConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_init_code_override() {
        let config = LedgerConfig {
            token_init_code_hash: Some(Hash256::new([7u8; 32])),
            ..LedgerConfig::default()
        };
        assert_eq!(config.factory_options().init_code_hash, Hash256::new([7u8; 32]));
        assert_eq!(
            LedgerConfig::default().factory_options().init_code_hash,
            creator_coin_init_code_hash()
        );
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(LedgerConfig::from_toml_str("chain_id = \"one\"").is_err());
    }
}
