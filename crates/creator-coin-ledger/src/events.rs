//! Append-only audit events
//!
//! Calls record events into a [`Journal`]; the ledger commits a journal to
//! its permanent log only when the call that produced it succeeds.

use serde::{Deserialize, Serialize};
use tracing::debug;

use creator_coin_core::{Address, Hash256};

use crate::access_control::Role;

/// Event emitted by a factory, token or bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    CreatorCoinDeployed {
        curve_id_hash: Hash256,
        address: Address,
        curve_id: String,
        name: String,
        symbol: String,
        decimals: u8,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    CreatorCoinBridgedToMainnet {
        token: Address,
        curve_id: String,
        receiver: Address,
        amount: u128,
    },
    CreatorCoinBridgedToSideChain {
        token: Address,
        curve_id: String,
        owner: Address,
        amount: u128,
    },
    Transfer {
        from: Address,
        to: Address,
        value: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: u128,
    },
    RoleGranted {
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        role: Role,
        account: Address,
        sender: Address,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CreatorCoinDeployed { .. } => "CreatorCoinDeployed",
            Event::OwnershipTransferred { .. } => "OwnershipTransferred",
            Event::CreatorCoinBridgedToMainnet { .. } => "CreatorCoinBridgedToMainnet",
            Event::CreatorCoinBridgedToSideChain { .. } => "CreatorCoinBridgedToSideChain",
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::RoleGranted { .. } => "RoleGranted",
            Event::RoleRevoked { .. } => "RoleRevoked",
        }
    }
}

/// An event together with the contract that emitted it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub emitter: Address,
    pub event: Event,
}

/// Events recorded during one call
#[derive(Debug, Clone, Default)]
pub struct Journal {
    logs: Vec<Log>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, emitter: Address, event: Event) {
        debug!("{} emitted {}", emitter.short(), event.name());
        self.logs.push(Log { emitter, event });
    }

    /// Append the events of a nested call that succeeded
    pub fn append(&mut self, other: Journal) {
        self.logs.extend(other.logs);
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.logs.iter().map(|log| &log.event)
    }

    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.logs.len()
    }

    pub fn into_logs(self) -> Vec<Log> {
        self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_journal_append_keeps_order() {
        let a = Address::new([1; 20]);
        let mut outer = Journal::new();
        outer.emit(a, Event::Transfer { from: Address::ZERO, to: a, value: 1 });

        let mut inner = Journal::new();
        inner.emit(a, Event::Approval { owner: a, spender: a, value: 2 });
        outer.append(inner);

        let names: Vec<_> = outer.events().map(Event::name).collect();
        assert_eq!(names, vec!["Transfer", "Approval"]);
    }

    #[test]
    fn test_log_json_shape() {
        let log = Log {
            emitter: Address::new([2; 20]),
            event: Event::OwnershipTransferred {
                previous_owner: Address::ZERO,
                new_owner: Address::new([3; 20]),
            },
        };
        let json = serde_json::to_value(&log).unwrap();
        assert!(json["event"]["OwnershipTransferred"].is_object());
        assert_eq!(json["emitter"], format!("0x{}", "02".repeat(20)));
    }
}
