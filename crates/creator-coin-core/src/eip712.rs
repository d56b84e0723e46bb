//! EIP-712 structured data hashing for permit signatures
//!
//! A permit lets a holder approve a spender off-ledger: the holder signs
//! `Permit { owner, spender, value, nonce, deadline }` under a domain bound to
//! one token instance and chain, and anyone may submit the signature.

use serde::{Deserialize, Serialize};

use crate::hash::{keccak256, keccak256_multi, word_u128, word_u64};
use crate::signature::{recover_signer, RecoverableSignature};
use crate::types::{Address, ChainId, Hash256};

/// Type string of the domain separator struct
pub const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

/// Type string of the permit struct
pub const PERMIT_TYPE: &str =
    "Permit(address owner,address spender,uint256 value,uint256 nonce,uint256 deadline)";

pub fn domain_typehash() -> Hash256 {
    keccak256(DOMAIN_TYPE.as_bytes())
}

pub fn permit_typehash() -> Hash256 {
    keccak256(PERMIT_TYPE.as_bytes())
}

/// Signing domain of one token instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eip712Domain {
    pub name: String,
    pub version: String,
    pub chain_id: ChainId,
    pub verifying_contract: Address,
}

impl Eip712Domain {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        chain_id: ChainId,
        verifying_contract: Address,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            chain_id,
            verifying_contract,
        }
    }

    /// Domain separator
    pub fn separator(&self) -> Hash256 {
        keccak256_multi(&[
            domain_typehash().as_bytes(),
            keccak256(self.name.as_bytes()).as_bytes(),
            keccak256(self.version.as_bytes()).as_bytes(),
            &word_u64(self.chain_id.as_u64()),
            &self.verifying_contract.to_word(),
        ])
    }
}

/// Permit payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub owner: Address,
    pub spender: Address,
    pub value: u128,
    pub nonce: u64,
    /// Last timestamp (inclusive) at which the permit may be consumed
    pub deadline: u64,
}

impl Permit {
    pub fn struct_hash(&self) -> Hash256 {
        keccak256_multi(&[
            permit_typehash().as_bytes(),
            &self.owner.to_word(),
            &self.spender.to_word(),
            &word_u128(self.value),
            &word_u64(self.nonce),
            &word_u64(self.deadline),
        ])
    }

    /// Digest the holder signs
    pub fn signing_hash(&self, domain: &Eip712Domain) -> Hash256 {
        typed_data_digest(domain, &self.struct_hash())
    }
}

/// `keccak256(0x19 0x01 ++ domainSeparator ++ structHash)`
pub fn typed_data_digest(domain: &Eip712Domain, struct_hash: &Hash256) -> Hash256 {
    keccak256_multi(&[
        &[0x19, 0x01],
        domain.separator().as_bytes(),
        struct_hash.as_bytes(),
    ])
}

/// Recover who signed `permit` under `domain`.
///
/// Stateless: nonce and deadline checks belong to the token that owns them.
pub fn verify_permit(
    domain: &Eip712Domain,
    permit: &Permit,
    signature: &RecoverableSignature,
) -> Option<Address> {
    recover_signer(&permit.signing_hash(domain), signature)
}
