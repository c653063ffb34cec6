//! Cryptographic engine contract.
//!
//! Key generation and stealth-address derivation are opaque to the planner.
//! The engine is only reached from [`Address::resolve`](crate::Address::resolve)
//! and wallet setup, never from plan execution directly.

use crate::chain::ChainAddress;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Public halves of a spending/viewing key pair.
///
/// Secret material stays inside the engine; `key_ref` is the handle the
/// engine uses to find it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPairs {
    pub spending_public_key: String,
    pub viewing_public_key: String,
    pub key_ref: String,
}

/// A one-time stealth address derived for a recipient meta-address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StealthDerivation {
    pub address: ChainAddress,
    /// Published alongside the payment so the recipient can find it
    pub ephemeral_public_key: String,
    pub view_tag: u8,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid input length (expected: {expected}, actual: {actual})")]
    InvalidInputLength { expected: usize, actual: usize },

    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("key derivation failed: {0}")]
    Derivation(String),
}

#[async_trait]
pub trait CryptoEngine: Send + Sync {
    async fn derive_key_pairs(&self) -> Result<KeyPairs, CryptoError>;

    /// Derive a one-time address for `meta_address` using `ephemeral` keys.
    ///
    /// `meta_address` is the hex payload without the `st:` scheme prefix.
    async fn derive_stealth_address(
        &self,
        meta_address: &str,
        ephemeral: &KeyPairs,
    ) -> Result<StealthDerivation, CryptoError>;
}
