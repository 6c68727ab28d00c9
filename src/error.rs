//! Error taxonomy
//!
//! Nothing here is fatal: every error path returns control to the idle
//! machine or the login prompt.

use thiserror::Error;

/// Bad credentials shape, recovered locally by re-prompting
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("username is empty")]
    EmptyUsername,
    #[error("password is empty")]
    EmptyPassword,
    #[error("username too long (len={len}, max={max})")]
    UsernameTooLong { len: usize, max: usize },
    #[error("username contains invalid character {0:?} (allowed: letters, digits, '.', '_')")]
    InvalidUsernameChar(char),
}

/// Account store read/write failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt record at {path}")]
    Corrupt { path: String },
}

/// Login/registration failure
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials: {0}")]
    Validation(#[from] ValidationError),
    #[error("wrong password")]
    WrongPassword,
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
}

/// Coin ledger failure
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Guarded precondition, not a fault
    #[error("insufficient funds (balance={balance}, required={required})")]
    InsufficientFunds { balance: u32, required: u32 },
    /// The in-memory balance already reflects the update
    #[error("balance {balance} not persisted: {source}")]
    Persistence {
        balance: u32,
        #[source]
        source: StoreError,
    },
}
