//! Creator coin factory
//!
//! Owns the registry from curve id to deployed coin. Coin addresses are
//! CREATE2 addresses salted with the curve id hash, so they can be computed
//! before deployment. The factory also holds the bridge pointer every coin
//! consults before privileged calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use creator_coin_core::{
    create2_address, curve_id_hash, Address, ChainId, Eip712Domain, Hash256,
};

use crate::config::FactoryOptions;
use crate::context::Msg;
use crate::error::{LedgerError, Result};
use crate::events::{Event, Journal};
use crate::token::{CoinMut, CoinParameters, CreatorCoin};

/// Ownership and bridge pointer of a factory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorySettings {
    /// Address of the factory itself
    pub address: Address,
    pub owner: Address,
    /// Zero until the owner calls `set_bridge`
    pub bridge: Address,
}

/// Registry entry for one deployed coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub curve_id: String,
    pub curve_id_hash: Hash256,
    pub address: Address,
}

/// Factory state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorCoinFactory {
    settings: FactorySettings,
    options: FactoryOptions,
    records: BTreeMap<Hash256, CoinRecord>,
    coins: BTreeMap<Address, CreatorCoin>,
}

impl CreatorCoinFactory {
    /// Create a factory at `address` owned by `deployer`
    pub fn new(
        address: Address,
        deployer: Address,
        options: FactoryOptions,
        journal: &mut Journal,
    ) -> Self {
        journal.emit(
            address,
            Event::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: deployer,
            },
        );
        info!("Factory deployed at {} by {}", address, deployer);
        Self {
            settings: FactorySettings {
                address,
                owner: deployer,
                bridge: Address::ZERO,
            },
            options,
            records: BTreeMap::new(),
            coins: BTreeMap::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.settings.address
    }

    pub fn owner(&self) -> Address {
        self.settings.owner
    }

    pub fn bridge(&self) -> Address {
        self.settings.bridge
    }

    pub fn settings(&self) -> &FactorySettings {
        &self.settings
    }

    pub fn chain_id(&self) -> ChainId {
        self.options.chain_id
    }

    /// Hash of the construction code shared by every coin
    pub fn init_code_hash(&self) -> Hash256 {
        self.options.init_code_hash
    }

    /// Address the coin for `curve_id` has, or will have once deployed
    pub fn compute_creator_coin_address(&self, curve_id: &str) -> Address {
        create2_address(
            &self.settings.address,
            &curve_id_hash(curve_id),
            &self.options.init_code_hash,
        )
    }

    /// Deployed coin for `curve_id`, or the zero address
    pub fn get_creator_coin_from_curve_id(&self, curve_id: &str) -> Address {
        self.record(curve_id)
            .map(|record| record.address)
            .unwrap_or(Address::ZERO)
    }

    pub fn record(&self, curve_id: &str) -> Option<&CoinRecord> {
        self.records.get(&curve_id_hash(curve_id))
    }

    pub fn records(&self) -> impl Iterator<Item = &CoinRecord> {
        self.records.values()
    }

    pub fn coin(&self, address: &Address) -> Option<&CreatorCoin> {
        self.coins.get(address)
    }

    pub fn coins(&self) -> impl Iterator<Item = &CreatorCoin> {
        self.coins.values()
    }

    /// Mutable coin handle bound to this factory's current bridge pointer
    pub fn coin_mut(&mut self, address: &Address) -> Option<CoinMut<'_>> {
        let factory = &self.settings;
        self.coins
            .get_mut(address)
            .map(|coin| CoinMut { coin, factory })
    }

    /// Deploy a coin with the default decimals
    pub fn deploy_creator_coin(
        &mut self,
        msg: &Msg,
        curve_id: &str,
        name: &str,
        symbol: &str,
        journal: &mut Journal,
    ) -> Result<Address> {
        let decimals = self.options.default_decimals;
        self.deploy_creator_coin_with_decimals(msg, curve_id, name, symbol, decimals, journal)
    }

    pub fn deploy_creator_coin_with_decimals(
        &mut self,
        msg: &Msg,
        curve_id: &str,
        name: &str,
        symbol: &str,
        decimals: u8,
        journal: &mut Journal,
    ) -> Result<Address> {
        self.only_owner(msg)?;

        let hash = curve_id_hash(curve_id);
        if self.records.contains_key(&hash) {
            return Err(LedgerError::AlreadyDeployed);
        }
        let address = create2_address(&self.settings.address, &hash, &self.options.init_code_hash);
        if self.coins.contains_key(&address) {
            return Err(LedgerError::AlreadyDeployed);
        }

        let params = CoinParameters {
            curve_id: curve_id.to_string(),
            curve_id_hash: hash,
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        };
        let domain = Eip712Domain::new(
            self.options.permit_domain_name.clone(),
            self.options.permit_domain_version.clone(),
            self.options.chain_id,
            address,
        );
        let coin = CreatorCoin::new(address, self.settings.address, params, domain);

        self.coins.insert(address, coin);
        self.records.insert(
            hash,
            CoinRecord {
                curve_id: curve_id.to_string(),
                curve_id_hash: hash,
                address,
            },
        );

        info!("Creator coin {} ({}) {} deployed to {}", name, symbol, curve_id, address);
        journal.emit(
            self.settings.address,
            Event::CreatorCoinDeployed {
                curve_id_hash: hash,
                address,
                curve_id: curve_id.to_string(),
                name: name.to_string(),
                symbol: symbol.to_string(),
                decimals,
            },
        );
        Ok(address)
    }

    /// Point every coin at a new bridge; takes effect on the next call
    pub fn set_bridge(&mut self, msg: &Msg, bridge: Address) -> Result<()> {
        self.only_owner(msg)?;
        if bridge.is_zero() {
            return Err(LedgerError::InvalidBridgeAddress);
        }
        info!("Factory bridge set to {}", bridge);
        self.settings.bridge = bridge;
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        msg: &Msg,
        new_owner: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.only_owner(msg)?;
        if new_owner.is_zero() {
            return Err(LedgerError::InvalidOwnerAddress);
        }
        let previous_owner = self.settings.owner;
        self.settings.owner = new_owner;
        info!("Factory ownership transferred from {} to {}", previous_owner, new_owner);
        journal.emit(
            self.settings.address,
            Event::OwnershipTransferred {
                previous_owner,
                new_owner,
            },
        );
        Ok(())
    }

    fn only_owner(&self, msg: &Msg) -> Result<()> {
        if msg.sender != self.settings.owner {
            warn!("Rejected factory call from non-owner {}", msg.sender);
            return Err(LedgerError::NotOwner);
        }
        Ok(())
    }
}
