//! Error types for ledger operations
//!
//! Every variant renders as a short, stable reason string so tooling can
//! match on the exact violated precondition.

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Broad classes of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks the owner, bridge or role status the call requires
    Authorization,
    /// The call conflicts with existing state
    StateConflict,
    /// An argument or signature is invalid
    Validation,
    /// Supply or balance arithmetic overflowed
    Arithmetic,
    /// Configuration or persistence problem outside a ledger call
    Environment,
}

/// Errors that can occur while executing ledger calls
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Caller is not the factory owner
    #[error("caller is not the owner")]
    NotOwner,

    /// Caller is not the bridge the factory currently points at
    #[error("only bridge")]
    OnlyBridge,

    /// Caller does not hold the minter role
    #[error("caller is not a minter")]
    OnlyMinter,

    /// Caller does not hold the admin role of the role being changed
    #[error("AccessControl: sender must be an admin")]
    MissingRoleAdmin,

    /// Roles may only be renounced by their holder
    #[error("AccessControl: can only renounce roles for self")]
    RenounceForOther,

    /// A coin already exists for this curve id
    #[error("already deployed")]
    AlreadyDeployed,

    /// No coin exists for this curve id
    #[error("coin not deployed")]
    CoinNotDeployed,

    /// A factory or bridge is required but has not been deployed
    #[error("{0} not deployed")]
    ContractNotDeployed(&'static str),

    /// A factory or bridge was deployed twice on one ledger
    #[error("{0} already deployed")]
    ContractAlreadyDeployed(&'static str),

    /// The bridge was handed a factory other than the one it was built for
    #[error("unknown factory")]
    FactoryMismatch,

    /// Null address passed to `set_bridge`
    #[error("invalid bridge address")]
    InvalidBridgeAddress,

    /// Null address passed to `transfer_ownership`
    #[error("Ownable: new owner is the zero address")]
    InvalidOwnerAddress,

    /// Permit consumed after its deadline
    #[error("ERC20Permit: expired deadline")]
    PermitExpired,

    /// Permit signature was not produced by the owner
    #[error("ERC20Permit: invalid signature")]
    InvalidSignature,

    #[error("ERC20: transfer amount exceeds allowance")]
    InsufficientAllowance,

    #[error("ERC20: transfer amount exceeds balance")]
    InsufficientBalance,

    #[error("ERC20: burn amount exceeds balance")]
    BurnExceedsBalance,

    /// Zero address used where a real account is required
    #[error("ERC20: {0} the zero address")]
    ZeroAddress(&'static str),

    /// Block clock moved backwards
    #[error("timestamp {requested} is before the current block time {current}")]
    ClockRewind { current: u64, requested: u64 },

    /// Supply or balance overflow
    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] creator_coin_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Classify the failure
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            NotOwner | OnlyBridge | OnlyMinter | MissingRoleAdmin | RenounceForOther => {
                ErrorKind::Authorization
            }
            AlreadyDeployed
            | CoinNotDeployed
            | ContractNotDeployed(_)
            | ContractAlreadyDeployed(_)
            | FactoryMismatch => ErrorKind::StateConflict,
            InvalidBridgeAddress
            | InvalidOwnerAddress
            | PermitExpired
            | InvalidSignature
            | InsufficientAllowance
            | InsufficientBalance
            | BurnExceedsBalance
            | ZeroAddress(_)
            | ClockRewind { .. }
            | Core(_) => ErrorKind::Validation,
            ArithmeticOverflow => ErrorKind::Arithmetic,
            Io(_) | Serialization(_) | Config(_) => ErrorKind::Environment,
        }
    }

    /// Stable human-readable reason
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for LedgerError {
    fn from(e: toml::de::Error) -> Self {
        LedgerError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for LedgerError {
    fn from(e: toml::ser::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
