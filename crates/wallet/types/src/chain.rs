//! Chain-facing value types and the transport contract.
//!
//! ABI encoding and RPC plumbing live behind [`ChainTransport`]; the planner
//! only ever hands it a typed [`Transaction`] and reads back a [`TxReceipt`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const ADDRESS_LEN: usize = 20;

// ── Chain Address ────────────────────────────────────────────────────

/// A 20-byte on-chain account address
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainAddress([u8; ADDRESS_LEN]);

impl ChainAddress {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainAddressError {
    #[error("chain address must start with '0x'")]
    MissingPrefix,

    #[error("chain address is not valid hex: {0}")]
    InvalidHex(String),

    #[error("chain address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

impl FromStr for ChainAddress {
    type Err = ChainAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(ChainAddressError::MissingPrefix)?;
        let bytes =
            hex::decode(digits).map_err(|e| ChainAddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|raw: Vec<u8>| ChainAddressError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: raw.len(),
            })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for ChainAddress {
    type Error = ChainAddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainAddress> for String {
    fn from(value: ChainAddress) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ChainAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainAddress({})", self)
    }
}

// ── Transactions ─────────────────────────────────────────────────────

/// Typed description of the contract call a transaction performs.
///
/// The transport owns the ABI; this enum is what it encodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CallData {
    /// `announcement` carries the ephemeral public key of a stealth payment,
    /// which the recipient scans for to find it
    NativeTransfer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        announcement: Option<String>,
    },
    TokenTransfer {
        token: ChainAddress,
        recipient: ChainAddress,
        amount: u128,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        announcement: Option<String>,
    },
    SponsorGas {
        smart_account: ChainAddress,
        gas_limit: u64,
    },
    DepositToCustody {
        custody: ChainAddress,
        token: Option<ChainAddress>,
        amount: u128,
    },
    SponsorGasAndDeposit {
        custody: ChainAddress,
        token: Option<ChainAddress>,
        amount: u128,
        gas_limit: u64,
    },
}

impl CallData {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NativeTransfer { .. } => "native_transfer",
            Self::TokenTransfer { .. } => "token_transfer",
            Self::SponsorGas { .. } => "sponsor_gas",
            Self::DepositToCustody { .. } => "deposit_to_custody",
            Self::SponsorGasAndDeposit { .. } => "sponsor_gas_and_deposit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: ChainAddress,
    pub to: ChainAddress,
    /// Native value attached to the call, in the chain's smallest unit
    pub value: u128,
    pub call: CallData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
}

/// On-chain view of an account, as reported by [`ChainTransport::query_state`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Whether contract code is deployed at the address
    pub deployed: bool,
    pub nonce: u64,
    pub balance: u128,
    /// Custody contract a smart account is bound to, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custody: Option<ChainAddress>,
}

// ── Transport Contract ───────────────────────────────────────────────

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain transport unavailable: {0}")]
    Unavailable(String),

    #[error("transaction reverted: {reason}")]
    Reverted {
        tx_hash: Option<String>,
        reason: String,
    },

    #[error("insufficient balance (required: {required}, available: {available})")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("transaction rejected: {0}")]
    Rejected(String),
}

impl ChainError {
    /// Whether retrying the same read may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Chain RPC boundary.
///
/// Submission is at-least-once: a retried `broadcast` may double-submit unless
/// the implementation deduplicates, so callers must not retry it blindly.
#[async_trait]
pub trait ChainTransport: Send + Sync {
    async fn broadcast(&self, transaction: &Transaction) -> Result<TxReceipt, ChainError>;

    async fn query_state(&self, address: &ChainAddress) -> Result<AccountState, ChainError>;
}
