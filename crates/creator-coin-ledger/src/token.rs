//! Creator coin: a fungible balance ledger with bridge-gated supply
//!
//! Holders use the standard transfer / approve / burn operations and may
//! authorize a spender with a signed permit. Minting and the two sidechain
//! supply counters can only be changed by the address the coin's factory
//! currently names as its bridge. That address is read from the factory on
//! every privileged call, so re-pointing the bridge takes effect immediately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use creator_coin_core::{
    verify_permit, Address, Eip712Domain, Hash256, Permit, RecoverableSignature,
};

use crate::context::Msg;
use crate::error::{LedgerError, Result};
use crate::events::{Event, Journal};
use crate::factory::FactorySettings;

/// Construction parameters the factory hands a new coin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinParameters {
    pub curve_id: String,
    pub curve_id_hash: Hash256,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// A permit as submitted to the coin: the signed fields apart from the
/// nonce, which is read from the coin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedPermit {
    pub owner: Address,
    pub spender: Address,
    pub value: u128,
    pub deadline: u64,
    pub signature: RecoverableSignature,
}

impl SignedPermit {
    /// Pair the signed message with its signature
    pub fn from_permit(permit: &Permit, signature: RecoverableSignature) -> Self {
        Self {
            owner: permit.owner,
            spender: permit.spender,
            value: permit.value,
            deadline: permit.deadline,
            signature,
        }
    }
}

/// State of one deployed creator coin
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorCoin {
    address: Address,
    factory: Address,
    curve_id: String,
    curve_id_hash: Hash256,
    name: String,
    symbol: String,
    decimals: u8,
    domain: Eip712Domain,
    total_supply: u128,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
    nonces: BTreeMap<Address, u64>,
    total_sidechain_supply: u128,
    current_sidechain_supply: u128,
}

impl CreatorCoin {
    pub(crate) fn new(
        address: Address,
        factory: Address,
        params: CoinParameters,
        domain: Eip712Domain,
    ) -> Self {
        Self {
            address,
            factory,
            curve_id: params.curve_id,
            curve_id_hash: params.curve_id_hash,
            name: params.name,
            symbol: params.symbol,
            decimals: params.decimals,
            domain,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            nonces: BTreeMap::new(),
            total_sidechain_supply: 0,
            current_sidechain_supply: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Factory that deployed this coin
    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Curve id the coin was deployed under
    pub fn curve_id(&self) -> &str {
        &self.curve_id
    }

    pub fn curve_id_hash(&self) -> Hash256 {
        self.curve_id_hash
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn total_sidechain_supply(&self) -> u128 {
        self.total_sidechain_supply
    }

    pub fn current_sidechain_supply(&self) -> u128 {
        self.current_sidechain_supply
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Next permit nonce for `owner`
    pub fn nonces(&self, owner: &Address) -> u64 {
        self.nonces.get(owner).copied().unwrap_or(0)
    }

    /// Permit signing domain
    pub fn domain(&self) -> &Eip712Domain {
        &self.domain
    }

    pub fn domain_separator(&self) -> Hash256 {
        self.domain.separator()
    }

    /// Holders with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter().filter(|(_, balance)| **balance > 0)
    }

    pub fn transfer(
        &mut self,
        msg: &Msg,
        to: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        self.move_balance(msg.sender, to, amount, journal)
    }

    pub fn approve(
        &mut self,
        msg: &Msg,
        spender: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        self.set_allowance(msg.sender, spender, amount, journal)
    }

    /// Move `amount` from `from` to `to`, spending the caller's allowance
    pub fn transfer_from(
        &mut self,
        msg: &Msg,
        from: Address,
        to: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        let allowed = self.allowance(&from, &msg.sender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance);
        }
        self.move_balance(from, to, amount, journal)?;
        self.set_allowance(from, msg.sender, allowed - amount, journal)
    }

    /// Destroy `amount` of the caller's own balance
    pub fn burn(&mut self, msg: &Msg, amount: u128, journal: &mut Journal) -> Result<()> {
        let account = msg.sender;
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress("burn from"));
        }
        let balance = self.balance_of(&account);
        if balance < amount {
            return Err(LedgerError::BurnExceedsBalance);
        }
        // total_supply >= balance, so neither subtraction can underflow
        self.balances.insert(account, balance - amount);
        self.total_supply -= amount;
        debug!("Burned {} {} from {}", amount, self.symbol, account);
        journal.emit(
            self.address,
            Event::Transfer {
                from: account,
                to: Address::ZERO,
                value: amount,
            },
        );
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s balance from a signed permit.
    ///
    /// The signature must cover the owner's current nonce, which is consumed
    /// on success, so each signature is usable exactly once.
    pub fn permit(
        &mut self,
        msg: &Msg,
        signed: &SignedPermit,
        journal: &mut Journal,
    ) -> Result<()> {
        let SignedPermit {
            owner,
            spender,
            value,
            deadline,
            signature,
        } = *signed;
        if msg.timestamp > deadline {
            return Err(LedgerError::PermitExpired);
        }

        let nonce = self.nonces(&owner);
        let permit = Permit {
            owner,
            spender,
            value,
            nonce,
            deadline,
        };
        match verify_permit(&self.domain, &permit, &signature) {
            Some(signer) if signer == owner && !owner.is_zero() => {}
            _ => return Err(LedgerError::InvalidSignature),
        }
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress("approve to"));
        }

        let next = nonce.checked_add(1).ok_or(LedgerError::ArithmeticOverflow)?;
        self.nonces.insert(owner, next);
        self.set_allowance(owner, spender, value, journal)
    }

    pub(crate) fn mint(
        &mut self,
        authority: &FactorySettings,
        msg: &Msg,
        to: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        self.only_bridge(authority, msg)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress("mint to"));
        }
        let total = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::ArithmeticOverflow)?;
        // A balance never exceeds the total supply, so this cannot overflow
        // once the total has been checked
        let balance = self.balance_of(&to) + amount;

        self.total_supply = total;
        self.balances.insert(to, balance);
        debug!("Minted {} {} to {}", amount, self.symbol, to);
        journal.emit(
            self.address,
            Event::Transfer {
                from: Address::ZERO,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    pub(crate) fn set_total_sidechain_supply(
        &mut self,
        authority: &FactorySettings,
        msg: &Msg,
        amount: u128,
    ) -> Result<()> {
        self.only_bridge(authority, msg)?;
        debug!("{} total sidechain supply set to {}", self.symbol, amount);
        self.total_sidechain_supply = amount;
        Ok(())
    }

    pub(crate) fn update_current_sidechain_supply(
        &mut self,
        authority: &FactorySettings,
        msg: &Msg,
        amount: u128,
    ) -> Result<()> {
        self.only_bridge(authority, msg)?;
        debug!("{} current sidechain supply set to {}", self.symbol, amount);
        self.current_sidechain_supply = amount;
        Ok(())
    }

    fn only_bridge(&self, authority: &FactorySettings, msg: &Msg) -> Result<()> {
        if authority.address != self.factory {
            return Err(LedgerError::FactoryMismatch);
        }
        if authority.bridge.is_zero() || msg.sender != authority.bridge {
            warn!(
                "Rejected privileged call on {} from {}",
                self.symbol, msg.sender
            );
            return Err(LedgerError::OnlyBridge);
        }
        Ok(())
    }

    fn move_balance(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        if from.is_zero() {
            return Err(LedgerError::ZeroAddress("transfer from"));
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress("transfer to"));
        }
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(LedgerError::InsufficientBalance);
        }

        self.balances.insert(from, from_balance - amount);
        // Sum of balances equals total supply, so the receiver cannot overflow
        let to_balance = self.balance_of(&to) + amount;
        self.balances.insert(to, to_balance);

        journal.emit(
            self.address,
            Event::Transfer {
                from,
                to,
                value: amount,
            },
        );
        Ok(())
    }

    fn set_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        if owner.is_zero() {
            return Err(LedgerError::ZeroAddress("approve from"));
        }
        if spender.is_zero() {
            return Err(LedgerError::ZeroAddress("approve to"));
        }
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
        journal.emit(
            self.address,
            Event::Approval {
                owner,
                spender,
                value: amount,
            },
        );
        Ok(())
    }
}

/// Mutable access to a coin together with its factory's live settings.
///
/// Privileged operations are only reachable through this handle, which is
/// how a coin reads the current bridge pointer from its factory.
pub struct CoinMut<'a> {
    pub(crate) coin: &'a mut CreatorCoin,
    pub(crate) factory: &'a FactorySettings,
}

impl<'a> CoinMut<'a> {
    pub fn coin(&self) -> &CreatorCoin {
        self.coin
    }

    /// Current bridge as seen by the coin
    pub fn bridge(&self) -> Address {
        self.factory.bridge
    }

    pub fn mint(&mut self, msg: &Msg, to: Address, amount: u128, journal: &mut Journal) -> Result<()> {
        self.coin.mint(self.factory, msg, to, amount, journal)
    }

    pub fn set_total_sidechain_supply(&mut self, msg: &Msg, amount: u128) -> Result<()> {
        self.coin.set_total_sidechain_supply(self.factory, msg, amount)
    }

    pub fn update_current_sidechain_supply(&mut self, msg: &Msg, amount: u128) -> Result<()> {
        self.coin.update_current_sidechain_supply(self.factory, msg, amount)
    }

    pub fn transfer(&mut self, msg: &Msg, to: Address, amount: u128, journal: &mut Journal) -> Result<()> {
        self.coin.transfer(msg, to, amount, journal)
    }

    pub fn approve(
        &mut self,
        msg: &Msg,
        spender: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        self.coin.approve(msg, spender, amount, journal)
    }

    pub fn transfer_from(
        &mut self,
        msg: &Msg,
        from: Address,
        to: Address,
        amount: u128,
        journal: &mut Journal,
    ) -> Result<()> {
        self.coin.transfer_from(msg, from, to, amount, journal)
    }

    pub fn burn(&mut self, msg: &Msg, amount: u128, journal: &mut Journal) -> Result<()> {
        self.coin.burn(msg, amount, journal)
    }

    pub fn permit(
        &mut self,
        msg: &Msg,
        signed: &SignedPermit,
        journal: &mut Journal,
    ) -> Result<()> {
        self.coin.permit(msg, signed, journal)
    }

    /// Run `f` against a staged copy of the coin, committing the copy and its
    /// events only if `f` succeeds
    pub fn atomically<T>(
        &mut self,
        journal: &mut Journal,
        f: impl FnOnce(&mut CoinMut<'_>, &mut Journal) -> Result<T>,
    ) -> Result<T> {
        let mut staged = self.coin.clone();
        let mut scratch = Journal::new();
        let out = {
            let mut handle = CoinMut {
                coin: &mut staged,
                factory: self.factory,
            };
            f(&mut handle, &mut scratch)?
        };
        *self.coin = staged;
        journal.append(scratch);
        Ok(out)
    }
}
