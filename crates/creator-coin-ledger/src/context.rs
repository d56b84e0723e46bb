//! Per-call execution context

use serde::{Deserialize, Serialize};

use creator_coin_core::Address;

/// Who is calling and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Msg {
    /// Immediate caller: an account, or a contract making a nested call
    pub sender: Address,
    /// Block timestamp in seconds
    pub timestamp: u64,
}

impl Msg {
    pub fn new(sender: Address, timestamp: u64) -> Self {
        Self { sender, timestamp }
    }

    /// Context for a nested call made by `contract` during this call
    pub fn forward(&self, contract: Address) -> Self {
        Self {
            sender: contract,
            timestamp: self.timestamp,
        }
    }
}
