use super::{decode_intent, parse_amount, parse_token, require_kind, DEFAULT_GAS_LIMIT};
use crate::command::{Command, CommandReceipt, NamedCommand, ResolvedInputs};
use crate::context::ExecutionContext;
use crate::error::{BuildError, ExecutionError};
use async_trait::async_trait;
use serde::Deserialize;
use wallet_types::{Address, AddressKind, CallData, ChainAddress, ChainError, Intent, Transaction};

#[derive(Debug, Deserialize)]
struct SaSponsorGasAndDepositParams {
    amount: String,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    gas_limit: Option<u64>,
}

/// A smart account sponsors its own gas and deposits into its companion
/// custody contract in one call.
///
/// Native deposits check the account balance before broadcasting.
#[derive(Debug)]
pub struct SaSponsorGasAndDepositToCsucCommand {
    smart_account: Address,
    amount: u128,
    token: Option<ChainAddress>,
    gas_limit: u64,
    intent: Option<Intent>,
}

impl NamedCommand for SaSponsorGasAndDepositToCsucCommand {
    const NAME: &'static str = "sa-sponsor-gas-and-deposit-to-csuc";

    fn build(address: Address, intent: Option<Intent>) -> Result<Self, BuildError> {
        require_kind(Self::NAME, &address, &[AddressKind::SmartAccount])?;
        let params: SaSponsorGasAndDepositParams = decode_intent(Self::NAME, intent.as_ref())?;
        let gas_limit = params.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT);
        if gas_limit == 0 {
            return Err(BuildError::invalid_intent(Self::NAME, "gas_limit must be positive"));
        }

        Ok(Self {
            smart_account: address,
            amount: parse_amount(Self::NAME, &params.amount)?,
            token: parse_token(Self::NAME, params.token.as_deref())?,
            gas_limit,
            intent,
        })
    }
}

#[async_trait]
impl Command for SaSponsorGasAndDepositToCsucCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn address(&self) -> &Address {
        &self.smart_account
    }

    fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        let smart_account = inputs.address.address;
        let custody = inputs.address.custody.ok_or_else(|| {
            ExecutionError::Precondition(format!(
                "smart account {} resolved without a custody contract",
                smart_account
            ))
        })?;

        if self.token.is_none() {
            let state = ctx.transport().query_state(&smart_account).await?;
            if state.balance < self.amount {
                return Err(ChainError::InsufficientBalance {
                    required: self.amount,
                    available: state.balance,
                }
                .into());
            }
        }

        let transaction = Transaction {
            from: smart_account,
            to: custody,
            value: if self.token.is_none() { self.amount } else { 0 },
            call: CallData::SponsorGasAndDeposit {
                custody,
                token: self.token,
                amount: self.amount,
                gas_limit: self.gas_limit,
            },
        };
        let receipt = ctx.broadcast(&transaction).await?;
        Ok(CommandReceipt::new(Self::NAME, smart_account).with_transaction(receipt))
    }
}
