use thiserror::Error;
use wallet_types::{AddressKind, ChainError};

/// Plan construction errors.
///
/// Raised synchronously while building; a plan that fails to build is never
/// partially returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("command '{0}' is already registered")]
    DuplicateName(String),

    #[error("command '{command}' has an invalid address: {reason}")]
    InvalidAddress { command: String, reason: String },

    #[error("command '{0}' requires an intent")]
    MissingIntent(String),

    #[error("command '{command}' has an invalid intent: {reason}")]
    InvalidIntent { command: String, reason: String },

    #[error("command '{command}' cannot be bound to a {kind} address")]
    UnsupportedAddressKind { command: String, kind: AddressKind },

    #[error("process-wide command registry is already installed")]
    RegistryAlreadyInstalled,
}

impl BuildError {
    pub fn invalid_address(command: &str, reason: impl ToString) -> Self {
        Self::InvalidAddress {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_intent(command: &str, reason: impl ToString) -> Self {
        Self::InvalidIntent {
            command: command.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A command ran but the underlying operation failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("chain operation failed: {0}")]
    Chain(#[from] ChainError),

    #[error("precondition failed: {0}")]
    Precondition(String),

    #[error("execution timed out after {0} ms")]
    Timeout(u64),

    #[error("execution cancelled")]
    Cancelled,
}
