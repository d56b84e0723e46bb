//! Creator coin operator tooling
//!
//! Drives a persisted [`creator_coin_ledger::Ledger`]: deploys the factory
//! and bridge, deploys and funds coins, and moves coins across the bridge
//! in both directions.

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use commands::{execute, run, Cli, ClockCommands, Commands};
pub use config::CliConfig;
pub use error::{CliError, Result};
pub use state::StateStore;
