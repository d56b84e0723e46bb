//! Local secp256k1 signing key for holders and operators

use k256::ecdsa::SigningKey;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::eip712::{Eip712Domain, Permit};
use crate::error::{Error, Result};
use crate::signature::RecoverableSignature;
use crate::types::{strip_0x, Address, Hash256};

/// A signing key together with the address it controls
#[derive(Clone)]
pub struct LocalWallet {
    key: SigningKey,
    address: Address,
}

impl LocalWallet {
    pub fn new(key: SigningKey) -> Self {
        let address = Address::from_verifying_key(key.verifying_key());
        Self { key, address }
    }

    /// Generate a fresh key from the OS RNG
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut OsRng))
    }

    /// Load a key from 32 hex-encoded bytes
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(hex::decode(strip_0x(s.trim()))?);
        if bytes.len() != 32 {
            return Err(Error::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|e| Error::Crypto(format!("Invalid private key: {}", e)))?;
        Ok(Self::new(key))
    }

    /// Hex-encoded private key, wiped from memory when dropped
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("0x{}", hex::encode(self.key.to_bytes())))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehashed digest
    pub fn sign_digest(&self, digest: &Hash256) -> Result<RecoverableSignature> {
        let (sig, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| Error::Crypto(format!("Signing failed: {}", e)))?;

        let bytes = sig.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature::new(27 + recovery_id.to_byte(), r, s))
    }

    /// Sign an EIP-712 permit under `domain`
    pub fn sign_permit(&self, domain: &Eip712Domain, permit: &Permit) -> Result<RecoverableSignature> {
        self.sign_digest(&permit.signing_hash(domain))
    }
}

impl std::fmt::Debug for LocalWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_key_address() {
        let wallet = LocalWallet::from_hex(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            wallet.address().to_checksum(),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn test_hex_roundtrip() {
        let wallet = LocalWallet::random();
        let restored = LocalWallet::from_hex(&wallet.to_hex()).unwrap();
        assert_eq!(restored.address(), wallet.address());
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(matches!(
            LocalWallet::from_hex("0x1234"),
            Err(Error::InvalidLength { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let wallet = LocalWallet::random();
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains(&wallet.to_hex()[2..]));
    }
}
