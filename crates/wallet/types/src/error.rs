//! Error types for address parsing, intent decoding, and resolution

use crate::address::AddressKind;
use crate::chain::{ChainAddress, ChainError};
use crate::crypto::CryptoError;
use thiserror::Error;

/// Raw reference could not be turned into an [`Address`](crate::Address)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("empty address reference")]
    Empty,

    #[error("unrecognized address reference '{0}'")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntentError {
    #[error("intent must be a JSON object")]
    NotAnObject,

    #[error("intent does not match the expected parameters: {0}")]
    Decode(String),
}

/// Address could not be resolved to an on-chain address.
///
/// Scoped to the plan leaf that needed the address.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("invalid {kind} reference '{raw}': {reason}")]
    InvalidReference {
        kind: AddressKind,
        raw: String,
        reason: String,
    },

    #[error("no contract deployed at {0}")]
    NotDeployed(ChainAddress),

    #[error("smart account {smart_account} is not bound to custody {expected} (chain reports {reported:?})")]
    CustodyMismatch {
        smart_account: ChainAddress,
        expected: ChainAddress,
        reported: Option<ChainAddress>,
    },

    #[error("chain query failed: {0}")]
    Chain(#[from] ChainError),

    #[error("stealth derivation failed: {0}")]
    Crypto(#[from] CryptoError),

    #[error("resolution timed out after {0} ms")]
    Timeout(u64),

    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolutionError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Chain(e) if e.is_transient())
    }
}
