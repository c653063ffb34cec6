//! Wallet domain types for the command planner
//!
//! This crate holds everything a plan refers to but does not execute:
//!
//! - [`Address`]: a typed, lazily resolved reference to a wallet-controlled
//!   address (custody contract, smart account, or stealth recipient)
//! - [`Intent`]: opaque, command-specific parameters
//! - [`ChainTransport`] / [`CryptoEngine`]: the external collaborators an
//!   address resolves against and a command executes against
//!
//! # Key Principle
//!
//! **Addresses are immutable and resolve at most once.** A resolved view is a
//! separate [`ResolvedAddress`] value cached inside the shared handle, so one
//! `Address` can be reached from several concurrent plan branches without
//! triggering duplicate chain queries.

#![deny(unsafe_code)]

pub mod address;
pub mod chain;
pub mod collaborators;
pub mod crypto;
pub mod error;
pub mod intent;

pub use address::{Address, AddressKind, ResolvedAddress};
pub use chain::{
    AccountState, CallData, ChainAddress, ChainAddressError, ChainError, ChainTransport,
    Transaction, TxReceipt,
};
pub use collaborators::Collaborators;
pub use crypto::{CryptoEngine, CryptoError, KeyPairs, StealthDerivation};
pub use error::{AddressError, IntentError, ResolutionError};
pub use intent::Intent;
