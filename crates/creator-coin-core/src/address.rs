//! Deterministic contract address derivation
//!
//! Both derivations are pure functions of public inputs, so any observer can
//! compute where a contract lives before it is deployed:
//!
//! - CREATE: `keccak256(rlp([deployer, nonce]))[12..]`
//! - CREATE2: `keccak256(0xff ++ deployer ++ salt ++ keccak256(init_code))[12..]`

use crate::hash::{curve_id_hash, keccak256, keccak256_multi};
use crate::types::{Address, Hash256};

/// Construction code identifying the creator coin implementation.
///
/// Constructor arguments are not part of it (the coin reads them from its
/// factory while being built), so every coin shares one init code hash.
pub const CREATOR_COIN_INIT_CODE: &[u8] = b"RallyV1CreatorCoin:erc20-permit-burnable:v1";

/// keccak256 of [`CREATOR_COIN_INIT_CODE`]
pub fn creator_coin_init_code_hash() -> Hash256 {
    keccak256(CREATOR_COIN_INIT_CODE)
}

/// Address of a contract created with CREATE by `deployer` at `nonce`
pub fn create_address(deployer: &Address, nonce: u64) -> Address {
    let nonce_bytes = nonce.to_be_bytes();
    let skip = nonce_bytes.iter().take_while(|b| **b == 0).count();
    let significant = &nonce_bytes[skip..];

    // rlp(nonce): 0 is the empty string, small values encode as themselves
    let mut nonce_rlp = Vec::with_capacity(9);
    match significant {
        [] => nonce_rlp.push(0x80),
        [b] if *b < 0x80 => nonce_rlp.push(*b),
        bytes => {
            nonce_rlp.push(0x80 + bytes.len() as u8);
            nonce_rlp.extend_from_slice(bytes);
        }
    }

    let payload_len = 21 + nonce_rlp.len();
    let mut rlp = Vec::with_capacity(1 + payload_len);
    rlp.push(0xc0 + payload_len as u8);
    rlp.push(0x80 + 20);
    rlp.extend_from_slice(deployer.as_bytes());
    rlp.extend_from_slice(&nonce_rlp);

    Address::from_hash_tail(&keccak256(&rlp))
}

/// Address of a contract created with CREATE2
pub fn create2_address(deployer: &Address, salt: &Hash256, init_code_hash: &Hash256) -> Address {
    let hash = keccak256_multi(&[
        &[0xff],
        deployer.as_bytes(),
        salt.as_bytes(),
        init_code_hash.as_bytes(),
    ]);
    Address::from_hash_tail(&hash)
}

/// Address at which `factory` deploys the coin for `curve_id`
pub fn creator_coin_address(
    factory: &Address,
    curve_id: &str,
    init_code_hash: &Hash256,
) -> Address {
    create2_address(factory, &curve_id_hash(curve_id), init_code_hash)
}
