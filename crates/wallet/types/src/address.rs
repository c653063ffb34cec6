//! Wallet addresses: typed references that resolve lazily, at most once
//!
//! Address kinds form a narrowing hierarchy expressed as a tagged shape rather
//! than nested types:
//!
//! - `Custody`: a custody contract address, the base kind
//! - `SmartAccount`: a smart account, which additionally names the custody
//!   contract it is bound to and resolves relative to it
//! - `Stealth`: a stealth meta-address that resolves to a fresh one-time
//!   address through the cryptographic engine
//! - `External`: a plain account outside the wallet, usable only as a payment
//!   recipient; it resolves without any chain lookup
//!
//! Every kind shares the same contract: [`Address::validate`] (structural,
//! no I/O) and [`Address::resolve`] (may suspend on chain or crypto calls).

use crate::chain::{ChainAddress, ChainAddressError};
use crate::collaborators::Collaborators;
use crate::error::{AddressError, ResolutionError};
use futures::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Scheme prefix of a stealth meta-address (`st:0x<spending><viewing>`)
pub const STEALTH_PREFIX: &str = "st:";

/// Two 33-byte compressed public keys, hex encoded
const STEALTH_META_HEX_LEN: usize = 132;

// ── Address Kind ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    Custody,
    SmartAccount,
    Stealth,
    External,
}

impl AddressKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Custody => "custody",
            Self::SmartAccount => "smart_account",
            Self::Stealth => "stealth",
            Self::External => "external",
        }
    }
}

impl fmt::Display for AddressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Resolved View ────────────────────────────────────────────────────

/// The usable on-chain form of an [`Address`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAddress {
    pub kind: AddressKind,
    pub address: ChainAddress,
    /// Companion custody contract (smart accounts only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custody: Option<ChainAddress>,
    /// Ephemeral key to announce with a stealth payment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ephemeral_public_key: Option<String>,
}

// ── Address ──────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
enum AddressShape {
    Custody,
    SmartAccount { custody: Address },
    Stealth,
    External,
}

struct AddressInner {
    shape: AddressShape,
    raw: String,
    resolved: OnceCell<ResolvedAddress>,
}

/// Shared, immutable address handle.
///
/// Cloning is cheap and every clone shares one resolution cache.
#[derive(Clone)]
pub struct Address {
    inner: Arc<AddressInner>,
}

impl Address {
    fn with_shape(shape: AddressShape, raw: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(AddressInner {
                shape,
                raw: raw.into(),
                resolved: OnceCell::new(),
            }),
        }
    }

    pub fn custody(raw: impl Into<String>) -> Self {
        Self::with_shape(AddressShape::Custody, raw)
    }

    /// A smart account bound to the companion `custody` contract
    pub fn smart_account(raw: impl Into<String>, custody: Address) -> Self {
        Self::with_shape(AddressShape::SmartAccount { custody }, raw)
    }

    pub fn stealth(meta_address: impl Into<String>) -> Self {
        Self::with_shape(AddressShape::Stealth, meta_address)
    }

    /// A plain account the wallet pays to but does not control
    pub fn external(raw: impl Into<String>) -> Self {
        Self::with_shape(AddressShape::External, raw)
    }

    /// Infer the kind from a raw reference.
    ///
    /// `st:` references are stealth meta-addresses and `0x` references are
    /// custody addresses. Smart accounts need their companion and cannot be
    /// inferred from a single string.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AddressError::Empty);
        }
        if raw.starts_with(STEALTH_PREFIX) {
            Ok(Self::stealth(raw))
        } else if raw.starts_with("0x") || raw.starts_with("0X") {
            Ok(Self::custody(raw))
        } else {
            Err(AddressError::Unrecognized(raw.to_string()))
        }
    }

    /// Infer the kind of a payment recipient.
    ///
    /// Like [`Address::parse`], except `0x` references are external accounts:
    /// a recipient need not have contract code deployed.
    pub fn parse_recipient(raw: &str) -> Result<Self, AddressError> {
        let address = Self::parse(raw)?;
        match address.kind() {
            AddressKind::Custody => Ok(Self::external(raw.trim())),
            _ => Ok(address),
        }
    }

    pub fn kind(&self) -> AddressKind {
        match self.inner.shape {
            AddressShape::Custody => AddressKind::Custody,
            AddressShape::SmartAccount { .. } => AddressKind::SmartAccount,
            AddressShape::Stealth => AddressKind::Stealth,
            AddressShape::External => AddressKind::External,
        }
    }

    pub fn raw_reference(&self) -> &str {
        &self.inner.raw
    }

    /// Companion custody address of a smart account
    pub fn companion(&self) -> Option<&Address> {
        match &self.inner.shape {
            AddressShape::SmartAccount { custody } => Some(custody),
            _ => None,
        }
    }

    /// The cached resolved view, if resolution already happened
    pub fn resolved(&self) -> Option<&ResolvedAddress> {
        self.inner.resolved.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.inner.resolved.initialized()
    }

    /// Whether two handles share one resolution cache
    pub fn ptr_eq(&self, other: &Address) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Structural check of the raw reference. Performs no I/O.
    pub fn validate(&self) -> bool {
        match &self.inner.shape {
            AddressShape::Custody | AddressShape::External => is_chain_address(&self.inner.raw),
            AddressShape::SmartAccount { custody } => {
                is_chain_address(&self.inner.raw)
                    && custody.kind() == AddressKind::Custody
                    && custody.validate()
            }
            AddressShape::Stealth => stealth_meta(&self.inner.raw).is_some(),
        }
    }

    /// Resolve to the on-chain form.
    ///
    /// Idempotent: once resolution succeeds the value is cached and later
    /// calls, including concurrent ones that were waiting on the first,
    /// return it without touching the collaborators again. A failed
    /// resolution is not cached.
    pub async fn resolve(
        &self,
        collaborators: &Collaborators,
    ) -> Result<ResolvedAddress, ResolutionError> {
        self.inner
            .resolved
            .get_or_try_init(|| self.resolve_uncached(collaborators))
            .await
            .cloned()
    }

    fn resolve_uncached<'a>(
        &'a self,
        collaborators: &'a Collaborators,
    ) -> BoxFuture<'a, Result<ResolvedAddress, ResolutionError>> {
        async move {
            tracing::debug!(
                kind = %self.kind(),
                reference = %self.inner.raw,
                "Resolving address"
            );
            let resolved = match &self.inner.shape {
                AddressShape::Custody => self.resolve_custody(collaborators).await,
                AddressShape::SmartAccount { custody } => {
                    self.resolve_smart_account(custody, collaborators).await
                }
                AddressShape::Stealth => self.resolve_stealth(collaborators).await,
                AddressShape::External => self.resolve_external(),
            }?;
            tracing::debug!(
                kind = %resolved.kind,
                address = %resolved.address,
                "Address resolved"
            );
            Ok(resolved)
        }
        .boxed()
    }

    async fn resolve_custody(
        &self,
        collaborators: &Collaborators,
    ) -> Result<ResolvedAddress, ResolutionError> {
        let address = self.chain_address()?;
        let state = collaborators.transport.query_state(&address).await?;
        if !state.deployed {
            return Err(ResolutionError::NotDeployed(address));
        }
        Ok(ResolvedAddress {
            kind: AddressKind::Custody,
            address,
            custody: None,
            ephemeral_public_key: None,
        })
    }

    fn resolve_external(&self) -> Result<ResolvedAddress, ResolutionError> {
        Ok(ResolvedAddress {
            kind: AddressKind::External,
            address: self.chain_address()?,
            custody: None,
            ephemeral_public_key: None,
        })
    }

    async fn resolve_smart_account(
        &self,
        custody: &Address,
        collaborators: &Collaborators,
    ) -> Result<ResolvedAddress, ResolutionError> {
        let address = self.chain_address()?;
        let custody = custody.resolve(collaborators).await?;

        let state = collaborators.transport.query_state(&address).await?;
        if !state.deployed {
            return Err(ResolutionError::NotDeployed(address));
        }
        if state.custody != Some(custody.address) {
            return Err(ResolutionError::CustodyMismatch {
                smart_account: address,
                expected: custody.address,
                reported: state.custody,
            });
        }

        Ok(ResolvedAddress {
            kind: AddressKind::SmartAccount,
            address,
            custody: Some(custody.address),
            ephemeral_public_key: None,
        })
    }

    async fn resolve_stealth(
        &self,
        collaborators: &Collaborators,
    ) -> Result<ResolvedAddress, ResolutionError> {
        let meta = stealth_meta(&self.inner.raw).ok_or_else(|| {
            self.invalid_reference(format!(
                "expected '{}0x' followed by {} hex characters",
                STEALTH_PREFIX, STEALTH_META_HEX_LEN
            ))
        })?;

        let ephemeral = collaborators.crypto.derive_key_pairs().await?;
        let derivation = collaborators
            .crypto
            .derive_stealth_address(meta, &ephemeral)
            .await?;

        Ok(ResolvedAddress {
            kind: AddressKind::Stealth,
            address: derivation.address,
            custody: None,
            ephemeral_public_key: Some(derivation.ephemeral_public_key),
        })
    }

    fn chain_address(&self) -> Result<ChainAddress, ResolutionError> {
        self.inner
            .raw
            .parse()
            .map_err(|e: ChainAddressError| self.invalid_reference(e.to_string()))
    }

    fn invalid_reference(&self, reason: impl Into<String>) -> ResolutionError {
        ResolutionError::InvalidReference {
            kind: self.kind(),
            raw: self.inner.raw.clone(),
            reason: reason.into(),
        }
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.inner.raw == other.inner.raw && self.inner.shape == other.inner.shape
    }
}

impl Eq for Address {}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Address");
        s.field("kind", &self.kind()).field("raw", &self.inner.raw);
        if let Some(custody) = self.companion() {
            s.field("custody", &custody.inner.raw);
        }
        s.field("resolved", &self.resolved().map(|r| r.address)).finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.inner.raw)
    }
}

fn is_chain_address(raw: &str) -> bool {
    raw.parse::<ChainAddress>().is_ok()
}

/// Hex payload of a well-formed stealth meta-address
fn stealth_meta(raw: &str) -> Option<&str> {
    let payload = raw.strip_prefix(STEALTH_PREFIX)?;
    let digits = payload.strip_prefix("0x")?;
    let well_formed = digits.len() == STEALTH_META_HEX_LEN
        && digits.bytes().all(|b| b.is_ascii_hexdigit());
    well_formed.then_some(payload)
}
