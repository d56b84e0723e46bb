//! Role-based access control for the bridge
//!
//! Membership is an explicit set per role, and every role names the role
//! allowed to administer it. `Admin` administers itself and `Minter`.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use creator_coin_core::{keccak256, Address, Hash256};

use crate::context::Msg;
use crate::error::{LedgerError, Result};
use crate::events::{Event, Journal};

/// Bridge roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May grant and revoke every role
    Admin,
    /// May mint on mainnet and assert sidechain supply
    Minter,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Minter];

    /// On-ledger role identifier
    pub fn id(&self) -> Hash256 {
        match self {
            Role::Admin => Hash256::ZERO,
            Role::Minter => keccak256(b"MINTER_ROLE"),
        }
    }

    pub fn from_id(id: &Hash256) -> Option<Role> {
        Self::ALL.into_iter().find(|role| role.id() == *id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Minter => "MINTER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" | "DEFAULT_ADMIN_ROLE" => Ok(Role::Admin),
            "MINTER" | "MINTER_ROLE" => Ok(Role::Minter),
            other => Err(LedgerError::Config(format!("unknown role: {}", other))),
        }
    }
}

/// Role membership and administration for one contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControl {
    /// Contract that emits role events
    contract: Address,
    members: BTreeMap<Role, BTreeSet<Address>>,
    admins: BTreeMap<Role, Role>,
}

impl AccessControl {
    /// Roles with `Admin` administering both roles and no members yet
    pub fn new(contract: Address) -> Self {
        let mut admins = BTreeMap::new();
        admins.insert(Role::Admin, Role::Admin);
        admins.insert(Role::Minter, Role::Admin);
        Self {
            contract,
            members: BTreeMap::new(),
            admins,
        }
    }

    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .is_some_and(|set| set.contains(account))
    }

    /// Role whose holders may grant and revoke `role`
    pub fn role_admin(&self, role: Role) -> Role {
        self.admins.get(&role).copied().unwrap_or(Role::Admin)
    }

    pub fn members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.members.get(&role).into_iter().flatten()
    }

    pub fn grant_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.check_admin(msg, role)?;
        self.setup_role(role, account, msg.sender, journal);
        Ok(())
    }

    pub fn revoke_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        self.check_admin(msg, role)?;
        self.remove_role(role, account, msg.sender, journal);
        Ok(())
    }

    /// Give up a role held by the caller
    pub fn renounce_role(
        &mut self,
        msg: &Msg,
        role: Role,
        account: Address,
        journal: &mut Journal,
    ) -> Result<()> {
        if account != msg.sender {
            return Err(LedgerError::RenounceForOther);
        }
        self.remove_role(role, account, msg.sender, journal);
        Ok(())
    }

    /// Grant without an admin check; used while constructing the contract
    pub(crate) fn setup_role(
        &mut self,
        role: Role,
        account: Address,
        sender: Address,
        journal: &mut Journal,
    ) {
        if self.members.entry(role).or_default().insert(account) {
            info!("Granted {} to {}", role, account);
            journal.emit(
                self.contract,
                Event::RoleGranted {
                    role,
                    account,
                    sender,
                },
            );
        }
    }

    fn remove_role(&mut self, role: Role, account: Address, sender: Address, journal: &mut Journal) {
        let removed = self
            .members
            .get_mut(&role)
            .is_some_and(|set| set.remove(&account));
        if removed {
            info!("Revoked {} from {}", role, account);
            journal.emit(
                self.contract,
                Event::RoleRevoked {
                    role,
                    account,
                    sender,
                },
            );
        }
    }

    fn check_admin(&self, msg: &Msg, role: Role) -> Result<()> {
        if self.has_role(self.role_admin(role), &msg.sender) {
            Ok(())
        } else {
            Err(LedgerError::MissingRoleAdmin)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: Address = Address([0xb0; 20]);
    const ADMIN: Address = Address([0x01; 20]);
    const OTHER: Address = Address([0x02; 20]);

    fn setup() -> (AccessControl, Journal) {
        let mut acl = AccessControl::new(CONTRACT);
        let mut journal = Journal::new();
        acl.setup_role(Role::Admin, ADMIN, ADMIN, &mut journal);
        (acl, journal)
    }

    #[test]
    fn test_role_admins() {
        let acl = AccessControl::new(CONTRACT);
        assert_eq!(acl.role_admin(Role::Admin), Role::Admin);
        assert_eq!(acl.role_admin(Role::Minter), Role::Admin);
    }

    #[test]
    fn test_role_ids() {
        assert_eq!(Role::Admin.id(), Hash256::ZERO);
        assert_eq!(
            Role::Minter.id().to_hex(),
            "0x9f2df0fed2c77648de5860a4cc508cd0818c85b8b8a1ab4ceeef8d981c8956a6"
        );
        assert_eq!(Role::from_id(&Role::Minter.id()), Some(Role::Minter));
    }

    #[test]
    fn test_admin_grants_and_revokes() {
        let (mut acl, mut journal) = setup();
        let msg = Msg::new(ADMIN, 0);

        acl.grant_role(&msg, Role::Minter, OTHER, &mut journal).unwrap();
        assert!(acl.has_role(Role::Minter, &OTHER));

        acl.revoke_role(&msg, Role::Minter, OTHER, &mut journal).unwrap();
        assert!(!acl.has_role(Role::Minter, &OTHER));

        let names: Vec<_> = journal.events().map(Event::name).collect();
        assert_eq!(names, vec!["RoleGranted", "RoleGranted", "RoleRevoked"]);
    }

    #[test]
    fn test_non_admin_cannot_grant() {
        let (mut acl, mut journal) = setup();
        let err = acl
            .grant_role(&Msg::new(OTHER, 0), Role::Minter, OTHER, &mut journal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingRoleAdmin));
        assert!(!acl.has_role(Role::Minter, &OTHER));
    }

    #[test]
    fn test_minter_cannot_administer_minters() {
        let (mut acl, mut journal) = setup();
        acl.grant_role(&Msg::new(ADMIN, 0), Role::Minter, OTHER, &mut journal)
            .unwrap();
        let err = acl
            .grant_role(&Msg::new(OTHER, 0), Role::Minter, CONTRACT, &mut journal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::MissingRoleAdmin));
    }

    #[test]
    fn test_regrant_emits_nothing() {
        let (mut acl, mut journal) = setup();
        let before = journal.len();
        acl.grant_role(&Msg::new(ADMIN, 0), Role::Admin, ADMIN, &mut journal)
            .unwrap();
        assert_eq!(journal.len(), before);
    }

    #[test]
    fn test_renounce_only_for_self() {
        let (mut acl, mut journal) = setup();
        let err = acl
            .renounce_role(&Msg::new(OTHER, 0), Role::Admin, ADMIN, &mut journal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::RenounceForOther));

        acl.renounce_role(&Msg::new(ADMIN, 0), Role::Admin, ADMIN, &mut journal)
            .unwrap();
        assert!(!acl.has_role(Role::Admin, &ADMIN));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("minter".parse::<Role>().unwrap(), Role::Minter);
        assert_eq!("DEFAULT_ADMIN_ROLE".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }
}
