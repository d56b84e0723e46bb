//! Recoverable secp256k1 signatures in `(v, r, s)` form

use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::types::{strip_0x, Address, Hash256};

/// ECDSA signature with recovery byte (65 bytes: r || s || v)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    /// Recovery byte, 27 or 28
    pub v: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl RecoverableSignature {
    pub fn new(v: u8, r: [u8; 32], s: [u8; 32]) -> Self {
        Self { v, r, s }
    }

    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 65 {
            return Err(Error::InvalidLength {
                expected: 65,
                actual: bytes.len(),
            });
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { v: bytes[64], r, s })
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(strip_0x(s.trim()))?;
        Self::from_bytes(&bytes)
    }

    fn recovery_id(&self) -> Result<RecoveryId> {
        match self.v {
            27 | 28 => RecoveryId::from_byte(self.v - 27).ok_or(Error::InvalidRecoveryByte(self.v)),
            other => Err(Error::InvalidRecoveryByte(other)),
        }
    }

    /// Recover the address that produced this signature over `digest`.
    ///
    /// High-`s` signatures are rejected so each message has exactly one
    /// valid encoding.
    pub fn recover(&self, digest: &Hash256) -> Result<Address> {
        let recovery_id = self.recovery_id()?;

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let sig = K256Signature::from_slice(&rs)
            .map_err(|e| Error::Crypto(format!("Invalid signature format: {}", e)))?;

        if sig.normalize_s().is_some() {
            return Err(Error::Crypto("Invalid signature 's' value".to_string()));
        }

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
            .map_err(|_| Error::SignatureVerificationFailed)?;
        Ok(Address::from_verifying_key(&key))
    }
}

/// Recover the signer of `digest`, or `None` if the signature is malformed
pub fn recover_signer(digest: &Hash256, signature: &RecoverableSignature) -> Option<Address> {
    signature.recover(digest).ok()
}

impl Serialize for RecoverableSignature {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RecoverableSignature {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::keccak256;
    use crate::wallet::LocalWallet;

    #[test]
    fn test_bytes_layout() {
        let sig = RecoverableSignature::new(28, [1u8; 32], [2u8; 32]);
        let bytes = sig.to_bytes();
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[32], 2);
        assert_eq!(bytes[64], 28);
        assert_eq!(RecoverableSignature::from_bytes(&bytes).unwrap(), sig);
        assert!(RecoverableSignature::from_bytes(&bytes[..64]).is_err());
    }

    #[test]
    fn test_recover_matches_signer() {
        let wallet = LocalWallet::from_hex(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let digest = keccak256(b"hello");
        let sig = wallet.sign_digest(&digest).unwrap();
        assert!(sig.v == 27 || sig.v == 28);
        assert_eq!(recover_signer(&digest, &sig), Some(wallet.address()));
    }

    #[test]
    fn test_recover_other_digest_gives_other_address() {
        let wallet = LocalWallet::random();
        let sig = wallet.sign_digest(&keccak256(b"a")).unwrap();
        assert_ne!(recover_signer(&keccak256(b"b"), &sig), Some(wallet.address()));
    }

    #[test]
    fn test_rejects_bad_v() {
        let wallet = LocalWallet::random();
        let digest = keccak256(b"msg");
        let mut sig = wallet.sign_digest(&digest).unwrap();
        sig.v = 1;
        assert_eq!(sig.recover(&digest), Err(Error::InvalidRecoveryByte(1)));
    }

    #[test]
    fn test_rejects_zero_signature() {
        let sig = RecoverableSignature::new(27, [0u8; 32], [0u8; 32]);
        assert!(recover_signer(&keccak256(b"msg"), &sig).is_none());
    }
}
