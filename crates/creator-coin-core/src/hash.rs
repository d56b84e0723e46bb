//! Keccak hashing and the minimal ABI word encoding the ledger needs

use sha3::{Digest, Keccak256};

use crate::types::Hash256;

/// Hash data using Keccak-256
pub fn keccak256(data: &[u8]) -> Hash256 {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    Hash256(hasher.finalize().into())
}

/// Hash multiple pieces of data using Keccak-256
pub fn keccak256_multi(data: &[&[u8]]) -> Hash256 {
    let mut hasher = Keccak256::new();
    for d in data {
        hasher.update(d);
    }
    Hash256(hasher.finalize().into())
}

/// Big-endian 32-byte word for an unsigned integer
pub fn word_u128(value: u128) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Big-endian 32-byte word for an unsigned integer
pub fn word_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// `abi.encode(string)`: head offset, length word, then the bytes
/// right-padded to a word boundary
pub fn encode_string(s: &str) -> Vec<u8> {
    let bytes = s.as_bytes();
    let padded = bytes.len().div_ceil(32) * 32;
    let mut out = Vec::with_capacity(64 + padded);
    out.extend_from_slice(&word_u64(0x20));
    out.extend_from_slice(&word_u64(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(64 + padded, 0);
    out
}

/// Content hash of a curve id: `keccak256(abi.encode(curve_id))`
///
/// Registry key and CREATE2 salt for the coin deployed under that id.
pub fn curve_id_hash(curve_id: &str) -> Hash256 {
    keccak256(&encode_string(curve_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak_empty() {
        assert_eq!(
            keccak256(b"").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_keccak_multi_matches_concat() {
        assert_eq!(keccak256_multi(&[b"ab", b"", b"c"]), keccak256(b"abc"));
    }

    #[test]
    fn test_encode_string_layout() {
        let enc = encode_string("some-curve-id");
        assert_eq!(enc.len(), 96);
        assert_eq!(enc[31], 0x20);
        assert_eq!(enc[63], 13);
        assert_eq!(&enc[64..77], b"some-curve-id");
        assert!(enc[77..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_encode_empty_string() {
        let enc = encode_string("");
        assert_eq!(enc.len(), 64);
        assert_eq!(enc[63], 0);
    }

    #[test]
    fn test_encode_exact_word() {
        let s = "a".repeat(32);
        assert_eq!(encode_string(&s).len(), 96);
    }

    #[test]
    fn test_curve_id_hash_is_not_raw_keccak() {
        assert_ne!(curve_id_hash("abc"), keccak256(b"abc"));
        assert_eq!(curve_id_hash("abc"), curve_id_hash("abc"));
    }

    #[test]
    fn test_words() {
        assert_eq!(word_u64(1)[31], 1);
        assert_eq!(word_u128(u128::MAX)[..16], [0u8; 16]);
        assert_eq!(word_u128(u128::MAX)[16..], [0xff; 16]);
    }
}
