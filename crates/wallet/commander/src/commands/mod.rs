//! Built-in wallet commands
//!
//! | Name | Bound address | Intent |
//! |---|---|---|
//! | `transfer` | custody or smart account | `to`, `amount`, `token?` |
//! | `sponsor-gas` | custody | `smart_account`, `gas_limit?` |
//! | `deposit-to-csuc` | custody or smart account | `custody?`, `amount`, `token?` |
//! | `sa-sponsor-gas-and-deposit-to-csuc` | smart account | `amount`, `token?`, `gas_limit?` |
//!
//! Amounts are decimal strings in the chain's smallest unit. Every command
//! broadcasts through [`ExecutionContext::broadcast`](crate::ExecutionContext::broadcast),
//! which refuses to send once the run is cancelled.

mod deposit;
mod sa_sponsor_gas_and_deposit;
mod sponsor_gas;
mod transfer;

pub use deposit::DepositToCsucCommand;
pub use sa_sponsor_gas_and_deposit::SaSponsorGasAndDepositToCsucCommand;
pub use sponsor_gas::SponsorGasCommand;
pub use transfer::TransferCommand;

use crate::error::BuildError;
use crate::registry::CommandRegistry;
use serde::de::DeserializeOwned;
use wallet_types::{Address, AddressKind, ChainAddress, Intent};

/// Gas limit used when an intent does not name one
pub const DEFAULT_GAS_LIMIT: u64 = 250_000;

type Registration = fn(&mut CommandRegistry) -> Result<(), BuildError>;

pub(crate) fn install_builtins(registry: &mut CommandRegistry) {
    let builtins: [Registration; 4] = [
        CommandRegistry::register_named::<TransferCommand>,
        CommandRegistry::register_named::<SponsorGasCommand>,
        CommandRegistry::register_named::<DepositToCsucCommand>,
        CommandRegistry::register_named::<SaSponsorGasAndDepositToCsucCommand>,
    ];
    for register in builtins {
        if let Err(e) = register(registry) {
            tracing::error!(error = %e, "Failed to register built-in command");
        }
    }
}

fn decode_intent<T: DeserializeOwned>(
    command: &str,
    intent: Option<&Intent>,
) -> Result<T, BuildError> {
    let intent = intent.ok_or_else(|| BuildError::MissingIntent(command.to_string()))?;
    intent
        .decode()
        .map_err(|e| BuildError::invalid_intent(command, e))
}

/// Positive amount from its decimal string form
fn parse_amount(command: &str, raw: &str) -> Result<u128, BuildError> {
    let amount: u128 = raw
        .trim()
        .parse()
        .map_err(|_| BuildError::invalid_intent(command, format!("invalid amount '{}'", raw)))?;
    if amount == 0 {
        return Err(BuildError::invalid_intent(command, "amount must be positive"));
    }
    Ok(amount)
}

fn parse_chain_address(command: &str, field: &str, raw: &str) -> Result<ChainAddress, BuildError> {
    raw.parse()
        .map_err(|e| BuildError::invalid_intent(command, format!("{}: {}", field, e)))
}

fn parse_token(command: &str, raw: Option<&str>) -> Result<Option<ChainAddress>, BuildError> {
    raw.map(|token| parse_chain_address(command, "token", token))
        .transpose()
}

fn require_kind(
    command: &str,
    address: &Address,
    allowed: &[AddressKind],
) -> Result<(), BuildError> {
    if allowed.contains(&address.kind()) {
        Ok(())
    } else {
        Err(BuildError::UnsupportedAddressKind {
            command: command.to_string(),
            kind: address.kind(),
        })
    }
}
