//! Sequential execution substrate
//!
//! The [`Ledger`] owns one factory, one bridge, a block clock and the
//! committed event log. Every public call runs to completion against a fresh
//! [`Journal`]; the journal is appended to the log only if the call
//! succeeds, and a failing call leaves all state as it was.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use creator_coin_core::{create_address, Address};

use crate::access_control::Role;
use crate::bridge::{CreatorCoinBridge, MainnetCredit, SidechainExit};
use crate::config::LedgerConfig;
use crate::context::Msg;
use crate::error::{LedgerError, Result};
use crate::events::{Journal, Log};
use crate::factory::CreatorCoinFactory;
use crate::token::{CoinMut, CreatorCoin, SignedPermit};

/// Ledger state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    config: LedgerConfig,
    timestamp: u64,
    /// CREATE nonces of accounts that deployed contracts
    account_nonces: BTreeMap<Address, u64>,
    factory: Option<CreatorCoinFactory>,
    bridge: Option<CreatorCoinBridge>,
    logs: Vec<Log>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl Ledger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            timestamp: config.genesis_timestamp,
            config,
            account_nonces: BTreeMap::new(),
            factory: None,
            bridge: None,
            logs: Vec::new(),
        }
    }

    /// Load a ledger previously written by [`Ledger::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Current block timestamp
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Move the clock forward to `timestamp`; the clock never runs backwards
    pub fn set_timestamp(&mut self, timestamp: u64) -> Result<()> {
        if timestamp < self.timestamp {
            return Err(LedgerError::ClockRewind {
                current: self.timestamp,
                requested: timestamp,
            });
        }
        self.timestamp = timestamp;
        Ok(())
    }

    pub fn advance_time(&mut self, seconds: u64) -> Result<u64> {
        self.timestamp = self
            .timestamp
            .checked_add(seconds)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(self.timestamp)
    }

    /// Call context for `sender` at the current block
    pub fn msg(&self, sender: Address) -> Msg {
        Msg::new(sender, self.timestamp)
    }

    // ========================================================================
    // Deployment
    // ========================================================================

    /// Address the next contract deployed by `deployer` will receive
    pub fn next_contract_address(&self, deployer: &Address) -> Address {
        let nonce = self.account_nonces.get(deployer).copied().unwrap_or(0);
        create_address(deployer, nonce)
    }

    pub fn deploy_factory(&mut self, deployer: Address) -> Result<Address> {
        if self.factory.is_some() {
            return Err(LedgerError::ContractAlreadyDeployed("factory"));
        }
        let address = self.next_contract_address(&deployer);
        let mut journal = Journal::new();
        let factory = CreatorCoinFactory::new(
            address,
            deployer,
            self.config.factory_options(),
            &mut journal,
        );
        self.bump_nonce(deployer)?;
        self.factory = Some(factory);
        self.commit(journal);
        Ok(address)
    }

    /// Deploy the bridge over the existing factory. The factory is not
    /// pointed at it; its owner must call `set_bridge`.
    pub fn deploy_bridge(&mut self, deployer: Address) -> Result<Address> {
        if self.bridge.is_some() {
            return Err(LedgerError::ContractAlreadyDeployed("bridge"));
        }
        let factory = self.factory()?.address();
        let address = self.next_contract_address(&deployer);
        let mut journal = Journal::new();
        let bridge = CreatorCoinBridge::new(address, factory, deployer, &mut journal);
        self.bump_nonce(deployer)?;
        self.bridge = Some(bridge);
        self.commit(journal);
        Ok(address)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn factory(&self) -> Result<&CreatorCoinFactory> {
        self.factory
            .as_ref()
            .ok_or(LedgerError::ContractNotDeployed("factory"))
    }

    pub fn bridge(&self) -> Result<&CreatorCoinBridge> {
        self.bridge
            .as_ref()
            .ok_or(LedgerError::ContractNotDeployed("bridge"))
    }

    /// Coin deployed at `address`
    pub fn coin(&self, address: &Address) -> Result<&CreatorCoin> {
        self.factory()?
            .coin(address)
            .ok_or(LedgerError::CoinNotDeployed)
    }

    /// Coin deployed for `curve_id`
    pub fn coin_for(&self, curve_id: &str) -> Result<&CreatorCoin> {
        let factory = self.factory()?;
        let address = factory.get_creator_coin_from_curve_id(curve_id);
        factory.coin(&address).ok_or(LedgerError::CoinNotDeployed)
    }

    /// Committed event log
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Committed events emitted by `emitter`
    pub fn logs_from<'a>(&'a self, emitter: &'a Address) -> impl Iterator<Item = &'a Log> + 'a {
        self.logs.iter().filter(move |log| log.emitter == *emitter)
    }

    // ========================================================================
    // Factory interface
    // ========================================================================

    pub fn deploy_creator_coin(
        &mut self,
        sender: Address,
        curve_id: &str,
        name: &str,
        symbol: &str,
    ) -> Result<Address> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        let address = self
            .factory_mut()?
            .deploy_creator_coin(&msg, curve_id, name, symbol, &mut journal)?;
        self.commit(journal);
        Ok(address)
    }

    pub fn deploy_creator_coin_with_decimals(
        &mut self,
        sender: Address,
        curve_id: &str,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<Address> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        let address = self.factory_mut()?.deploy_creator_coin_with_decimals(
            &msg,
            curve_id,
            name,
            symbol,
            decimals,
            &mut journal,
        )?;
        self.commit(journal);
        Ok(address)
    }

    /// Factory lookup; the zero address if nothing is deployed for `curve_id`
    pub fn get_creator_coin_from_curve_id(&self, curve_id: &str) -> Result<Address> {
        Ok(self.factory()?.get_creator_coin_from_curve_id(curve_id))
    }

    pub fn compute_creator_coin_address(&self, curve_id: &str) -> Result<Address> {
        Ok(self.factory()?.compute_creator_coin_address(curve_id))
    }

    pub fn set_bridge(&mut self, sender: Address, bridge: Address) -> Result<()> {
        let msg = self.msg(sender);
        self.factory_mut()?.set_bridge(&msg, bridge)
    }

    pub fn transfer_ownership(&mut self, sender: Address, new_owner: Address) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        self.factory_mut()?
            .transfer_ownership(&msg, new_owner, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    // ========================================================================
    // Bridge interface
    // ========================================================================

    pub fn bridge_to_mainnet(
        &mut self,
        sender: Address,
        curve_id: &str,
        receiver: Address,
        amount: u128,
        updated_sidechain_supply: u128,
    ) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        let (bridge, factory) = self.bridge_parts()?;
        let credit = MainnetCredit {
            receiver,
            amount,
            updated_sidechain_supply,
        };
        bridge.bridge_to_mainnet(factory, &msg, curve_id, credit, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    /// Burn the sender's coins for the sidechain. The exit carries the
    /// sender's permit signature over the bridge as spender.
    pub fn bridge_to_sidechain(
        &mut self,
        sender: Address,
        curve_id: &str,
        exit: &SidechainExit,
    ) -> Result<()> {
        self.bridge_to_sidechain_for(sender, sender, curve_id, exit)
    }

    /// Relay a holder's signed bridge-out request
    pub fn bridge_to_sidechain_for(
        &mut self,
        sender: Address,
        owner: Address,
        curve_id: &str,
        exit: &SidechainExit,
    ) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        let (bridge, factory) = self.bridge_parts()?;
        bridge.bridge_to_sidechain_for(factory, &msg, owner, curve_id, exit, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    pub fn set_total_sidechain_supply(
        &mut self,
        sender: Address,
        curve_id: &str,
        amount: u128,
    ) -> Result<()> {
        let msg = self.msg(sender);
        let (bridge, factory) = self.bridge_parts()?;
        bridge.set_total_sidechain_supply(factory, &msg, curve_id, amount)
    }

    /// Bridge lookup; fails if nothing is deployed for `curve_id`
    pub fn bridge_coin_for(&self, curve_id: &str) -> Result<Address> {
        self.bridge()?
            .get_creator_coin_from_curve_id(self.factory()?, curve_id)
    }

    pub fn has_role(&self, role: Role, account: &Address) -> Result<bool> {
        Ok(self.bridge()?.has_role(role, account))
    }

    pub fn get_role_admin(&self, role: Role) -> Result<Role> {
        Ok(self.bridge()?.get_role_admin(role))
    }

    pub fn grant_role(&mut self, sender: Address, role: Role, account: Address) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        self.bridge_mut()?
            .grant_role(&msg, role, account, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    pub fn revoke_role(&mut self, sender: Address, role: Role, account: Address) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        self.bridge_mut()?
            .revoke_role(&msg, role, account, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    pub fn renounce_role(&mut self, sender: Address, role: Role, account: Address) -> Result<()> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        self.bridge_mut()?
            .renounce_role(&msg, role, account, &mut journal)?;
        self.commit(journal);
        Ok(())
    }

    // ========================================================================
    // Token interface
    // ========================================================================

    pub fn transfer(
        &mut self,
        sender: Address,
        token: &Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.transfer(msg, to, amount, journal)
        })
    }

    pub fn approve(
        &mut self,
        sender: Address,
        token: &Address,
        spender: Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.approve(msg, spender, amount, journal)
        })
    }

    pub fn transfer_from(
        &mut self,
        sender: Address,
        token: &Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.transfer_from(msg, from, to, amount, journal)
        })
    }

    pub fn burn(&mut self, sender: Address, token: &Address, amount: u128) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.burn(msg, amount, journal)
        })
    }

    pub fn permit(
        &mut self,
        sender: Address,
        token: &Address,
        permit: &SignedPermit,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.permit(msg, permit, journal)
        })
    }

    /// Privileged token call made directly by `sender`; succeeds only if
    /// `sender` is the factory's current bridge
    pub fn mint(
        &mut self,
        sender: Address,
        token: &Address,
        to: Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, journal| {
            coin.mint(msg, to, amount, journal)
        })
    }

    pub fn update_current_sidechain_supply(
        &mut self,
        sender: Address,
        token: &Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, _| {
            coin.update_current_sidechain_supply(msg, amount)
        })
    }

    /// Token-level counterpart of [`Ledger::set_total_sidechain_supply`]:
    /// no role check, but `sender` must be the factory's current bridge
    pub fn set_coin_total_sidechain_supply(
        &mut self,
        sender: Address,
        token: &Address,
        amount: u128,
    ) -> Result<()> {
        self.with_coin(sender, token, |coin, msg, _| {
            coin.set_total_sidechain_supply(msg, amount)
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn factory_mut(&mut self) -> Result<&mut CreatorCoinFactory> {
        self.factory
            .as_mut()
            .ok_or(LedgerError::ContractNotDeployed("factory"))
    }

    fn bridge_mut(&mut self) -> Result<&mut CreatorCoinBridge> {
        self.bridge
            .as_mut()
            .ok_or(LedgerError::ContractNotDeployed("bridge"))
    }

    fn bridge_parts(&mut self) -> Result<(&CreatorCoinBridge, &mut CreatorCoinFactory)> {
        let bridge = self
            .bridge
            .as_ref()
            .ok_or(LedgerError::ContractNotDeployed("bridge"))?;
        let factory = self
            .factory
            .as_mut()
            .ok_or(LedgerError::ContractNotDeployed("factory"))?;
        Ok((bridge, factory))
    }

    fn with_coin<T>(
        &mut self,
        sender: Address,
        token: &Address,
        f: impl FnOnce(&mut CoinMut<'_>, &Msg, &mut Journal) -> Result<T>,
    ) -> Result<T> {
        let msg = self.msg(sender);
        let mut journal = Journal::new();
        let mut coin = self
            .factory_mut()?
            .coin_mut(token)
            .ok_or(LedgerError::CoinNotDeployed)?;
        let out = coin.atomically(&mut journal, |coin, journal| f(coin, &msg, journal))?;
        self.commit(journal);
        Ok(out)
    }

    fn bump_nonce(&mut self, deployer: Address) -> Result<()> {
        let nonce = self.account_nonces.entry(deployer).or_insert(0);
        *nonce = nonce.checked_add(1).ok_or(LedgerError::ArithmeticOverflow)?;
        Ok(())
    }

    fn commit(&mut self, journal: Journal) {
        if !journal.is_empty() {
            info!("Committed {} event(s) at {}", journal.len(), self.timestamp);
        }
        self.logs.extend(journal.into_logs());
    }
}
