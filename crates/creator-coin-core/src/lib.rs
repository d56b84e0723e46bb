//! Creator Coin Core - Primitive types, hashing and signature verification
//!
//! This crate provides the ledger-independent building blocks shared by the
//! creator coin factory, token and bridge: addresses and hashes, keccak-based
//! deterministic address derivation, and EIP-712 permit signatures.

pub mod address;
pub mod eip712;
pub mod error;
pub mod hash;
pub mod signature;
pub mod types;
pub mod wallet;

pub use address::{
    create2_address, create_address, creator_coin_address, creator_coin_init_code_hash,
    CREATOR_COIN_INIT_CODE,
};
pub use eip712::{typed_data_digest, verify_permit, Eip712Domain, Permit};
pub use error::{Error, Result};
pub use hash::{curve_id_hash, keccak256, keccak256_multi};
pub use signature::{recover_signer, RecoverableSignature};
pub use types::{Address, ChainId, Hash256};
pub use wallet::LocalWallet;

/// Decimals used when a coin is deployed without an explicit value
pub const DEFAULT_DECIMALS: u8 = 6;

/// EIP-712 domain name shared by every creator coin
pub const PERMIT_DOMAIN_NAME: &str = "rally-cc";

/// EIP-712 domain version
pub const PERMIT_DOMAIN_VERSION: &str = "1";
