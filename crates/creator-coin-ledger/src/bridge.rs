//! Bridge between the mainnet coin ledger and the sidechain
//!
//! Minting onto mainnet is role-gated: a trusted operator holding `Minter`
//! asserts that the amount was debited on the sidechain and reports the
//! sidechain's remaining supply. Moving coins back to the sidechain is
//! authorized by the holder's permit signature instead of the caller's
//! identity; the bridge pulls the coins and burns them.
//!
//! Each operation stages its changes on the affected coin and commits them
//! only if every step succeeds.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use creator_coin_core::{Address, RecoverableSignature};

use crate::access_control::{AccessControl, Role};
use crate::context::Msg;
use crate::error::{LedgerError, Result};
use crate::events::{Event, Journal};
use crate::factory::CreatorCoinFactory;
use crate::token::{CoinMut, SignedPermit};

/// Credit reported by a minter after debiting the sidechain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MainnetCredit {
    pub receiver: Address,
    pub amount: u128,
    /// Supply left on the sidechain after the debit
    pub updated_sidechain_supply: u128,
}

/// A holder's signed request to move `amount` to the sidechain. The
/// signature is a permit naming the bridge as spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SidechainExit {
    pub amount: u128,
    pub deadline: u64,
    pub signature: RecoverableSignature,
}

impl SidechainExit {
    pub fn new(amount: u128, deadline: u64, signature: RecoverableSignature) -> Self {
        Self {
            amount,
            deadline,
            signature,
        }
    }
}

/// Bridge state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatorCoinBridge {
    address: Address,
    factory: Address,
    roles: AccessControl,
}

impl CreatorCoinBridge {
    /// Create a bridge at `address` over `factory`; the deployer receives
    /// both `Admin` and `Minter`
    pub fn new(address: Address, factory: Address, deployer: Address, journal: &mut Journal) -> Self {
        let mut roles = AccessControl::new(address);
        roles.setup_role(Role::Admin, deployer, deployer, journal);
        roles.setup_role(Role::Minter, deployer, deployer, journal);
        info!("Bridge deployed at {} over factory {}", address, factory);
        Self {
            address,
            factory,
            roles,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Factory this bridge resolves coins through
    pub fn factory(&self) -> Address {
        self.factory
    }

    pub fn roles(&self) -> &AccessControl {
        &self.roles
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.roles.has_role(role, account)
    }

    pub fn get_role_admin(&self, role: Role) -> Role {
        self.roles.role_admin(role)
    }

    pub fn grant_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.roles.grant_role(msg, role, account, journal)
    }

    pub fn revoke_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.roles.revoke_role(msg, role, account, journal)
    }

    pub fn renounce_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.roles.renounce_role(msg, role, account, journal)
    }

    /// Coin deployed for `curve_id`; fails if there is none
    pub fn get_creator_coin_from_curve_id(
        &self,
        factory: &CreatorCoinFactory,
        curve_id: &str,
    ) -> Result<Address> {
        self.check_factory(factory)?;
        let address = factory.get_creator_coin_from_curve_id(curve_id);
        if address.is_zero() {
            return Err(LedgerError::CoinNotDeployed);
        }
        Ok(address)
    }

    /// Mint `amount` to `receiver` after it was debited on the sidechain,
    /// recording the sidechain's remaining supply
    pub fn bridge_to_mainnet(
        &self,
        factory: &mut CreatorCoinFactory,
        msg: &Msg,
        curve_id: &str,
        credit: MainnetCredit,
        journal: &mut Journal,
    ) -> Result<()> {
        let MainnetCredit {
            receiver,
            amount,
            updated_sidechain_supply,
        } = credit;
        self.only_minter(msg)?;
        let (token, mut coin) = self.resolve(factory, curve_id)?;
        let inner = msg.forward(self.address);

        coin.atomically(journal, |coin, journal| {
            coin.mint(&inner, receiver, amount, journal)?;
            coin.update_current_sidechain_supply(&inner, updated_sidechain_supply)?;
            journal.emit(
                self.address,
                Event::CreatorCoinBridgedToMainnet {
                    token,
                    curve_id: curve_id.to_string(),
                    receiver,
                    amount,
                },
            );
            Ok(())
        })?;

        info!(
            "Bridged {} of {} to mainnet for {} (sidechain supply now {})",
            amount, curve_id, receiver, updated_sidechain_supply
        );
        Ok(())
    }

    /// Record the total sidechain supply of a coin
    pub fn set_total_sidechain_supply(
        &self,
        factory: &mut CreatorCoinFactory,
        msg: &Msg,
        curve_id: &str,
        amount: u128,
    ) -> Result<()> {
        self.only_minter(msg)?;
        let (_, mut coin) = self.resolve(factory, curve_id)?;
        coin.set_total_sidechain_supply(&msg.forward(self.address), amount)?;
        info!("Total sidechain supply of {} set to {}", curve_id, amount);
        Ok(())
    }

    /// Burn the caller's coins on mainnet so they can be credited on the
    /// sidechain, authorized by the caller's permit signature
    pub fn bridge_to_sidechain(
        &self,
        factory: &mut CreatorCoinFactory,
        msg: &Msg,
        curve_id: &str,
        exit: &SidechainExit,
        journal: &mut Journal,
    ) -> Result<()> {
        self.bridge_to_sidechain_for(factory, msg, msg.sender, curve_id, exit, journal)
    }

    /// Burn `owner`'s coins on mainnet on the owner's behalf. Any caller may
    /// submit; the permit signature must come from `owner`.
    pub fn bridge_to_sidechain_for(
        &self,
        factory: &mut CreatorCoinFactory,
        msg: &Msg,
        owner: Address,
        curve_id: &str,
        exit: &SidechainExit,
        journal: &mut Journal,
    ) -> Result<()> {
        let (token, mut coin) = self.resolve(factory, curve_id)?;
        let inner = msg.forward(self.address);
        let amount = exit.amount;
        let permit = SignedPermit {
            owner,
            spender: self.address,
            value: amount,
            deadline: exit.deadline,
            signature: exit.signature,
        };

        coin.atomically(journal, |coin, journal| {
            coin.permit(&inner, &permit, journal)?;
            coin.transfer_from(&inner, owner, self.address, amount, journal)?;
            coin.burn(&inner, amount, journal)?;
            journal.emit(
                self.address,
                Event::CreatorCoinBridgedToSideChain {
                    token,
                    curve_id: curve_id.to_string(),
                    owner,
                    amount,
                },
            );
            Ok(())
        })?;

        info!("Bridged {} of {} to sidechain from {}", amount, curve_id, owner);
        Ok(())
    }

    fn resolve<'f>(
        &self,
        factory: &'f mut CreatorCoinFactory,
        curve_id: &str,
    ) -> Result<(Address, CoinMut<'f>)> {
        let token = self.get_creator_coin_from_curve_id(factory, curve_id)?;
        let coin = factory
            .coin_mut(&token)
            .ok_or(LedgerError::CoinNotDeployed)?;
        Ok((token, coin))
    }

    fn only_minter(&self, msg: &Msg) -> Result<()> {
        if !self.roles.has_role(Role::Minter, &msg.sender) {
            warn!("Rejected bridge call from non-minter {}", msg.sender);
            return Err(LedgerError::OnlyMinter);
        }
        Ok(())
    }

    fn check_factory(&self, factory: &CreatorCoinFactory) -> Result<()> {
        if factory.address() != self.factory {
            return Err(LedgerError::FactoryMismatch);
        }
        Ok(())
    }
}
