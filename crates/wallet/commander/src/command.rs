//! Commands: single units of work bound to an address and an optional intent
//!
//! A command validates its preconditions when the plan is built and executes
//! against an [`ExecutionContext`] when the engine reaches it. The engine
//! resolves the bound address and every declared dependency before calling
//! [`Command::execute`]; a command never sees an unresolved address.

use crate::context::ExecutionContext;
use crate::error::{BuildError, ExecutionError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use wallet_types::{Address, ChainAddress, Intent, ResolvedAddress, TxReceipt};

/// Addresses resolved for one leaf, in the order the command declared them
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedInputs {
    pub address: ResolvedAddress,
    pub dependencies: Vec<ResolvedAddress>,
}

impl ResolvedInputs {
    pub fn dependency(&self, index: usize) -> Result<&ResolvedAddress, ExecutionError> {
        self.dependencies.get(index).ok_or_else(|| {
            ExecutionError::Precondition(format!("dependency #{} was not resolved", index))
        })
    }
}

/// Success receipt of one command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReceipt {
    pub command: String,
    pub address: ChainAddress,
    pub transactions: Vec<TxReceipt>,
    pub completed_at: DateTime<Utc>,
}

impl CommandReceipt {
    pub fn new(command: impl Into<String>, address: ChainAddress) -> Self {
        Self {
            command: command.into(),
            address,
            transactions: Vec::new(),
            completed_at: Utc::now(),
        }
    }

    pub fn with_transaction(mut self, receipt: TxReceipt) -> Self {
        self.transactions.push(receipt);
        self
    }
}

#[async_trait]
pub trait Command: Send + Sync + fmt::Debug {
    /// Stable name, matching the registry entry that builds this command
    fn name(&self) -> &str;

    fn address(&self) -> &Address;

    fn intent(&self) -> Option<&Intent>;

    /// Further addresses that must be resolved before execution
    fn dependencies(&self) -> Vec<Address> {
        Vec::new()
    }

    /// Build-time precondition check. Must not perform I/O.
    fn validate(&self) -> Result<(), BuildError> {
        check_address(self.name(), self.address())?;
        for dependency in self.dependencies() {
            check_address(self.name(), &dependency)?;
        }
        Ok(())
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError>;
}

/// A command type that can be built straight from an address and intent.
///
/// This is the typed counterpart of a registry entry: the registry stores a
/// factory for `NAME`, the commander can also build the type directly.
pub trait NamedCommand: Command + Sized + 'static {
    const NAME: &'static str;

    fn build(address: Address, intent: Option<Intent>) -> Result<Self, BuildError>;
}

/// Structural address check shared by every command
pub fn check_address(command: &str, address: &Address) -> Result<(), BuildError> {
    if address.raw_reference().trim().is_empty() {
        return Err(BuildError::invalid_address(command, "empty address reference"));
    }
    if !address.validate() {
        return Err(BuildError::invalid_address(
            command,
            format!("malformed {} reference '{}'", address.kind(), address.raw_reference()),
        ));
    }
    Ok(())
}
