//! Error types for the creator coin primitives

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid signature 'v' value: {0}")]
    InvalidRecoveryByte(u8),

    #[error("Signature verification failed")]
    SignatureVerificationFailed,
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidHex(e.to_string())
    }
}
