//! Creator coin ledger
//!
//! State machines for the creator coin factory, the coins it deploys and the
//! bridge that reconciles coin supply between mainnet and the sidechain.
//!
//! # Components
//!
//! - [`CreatorCoinFactory`]: curve id registry, deterministic coin addresses,
//!   owner-gated deployment and the live bridge pointer
//! - [`CreatorCoin`]: balances, allowances and permits, with minting and the
//!   sidechain supply counters restricted to the factory's bridge
//! - [`CreatorCoinBridge`]: role-gated mainnet minting and signature-gated
//!   burns toward the sidechain
//! - [`Ledger`]: runs calls one at a time and commits their events only on
//!   success

pub mod access_control;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod factory;
pub mod ledger;
pub mod token;

pub use access_control::{AccessControl, Role};
pub use bridge::{CreatorCoinBridge, MainnetCredit, SidechainExit};
pub use config::{FactoryOptions, LedgerConfig};
pub use context::Msg;
pub use error::{ErrorKind, LedgerError, Result};
pub use events::{Event, Journal, Log};
pub use factory::{CoinRecord, CreatorCoinFactory, FactorySettings};
pub use ledger::Ledger;
pub use token::{CoinMut, CoinParameters, CreatorCoin, SignedPermit};
