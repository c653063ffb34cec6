use super::{decode_intent, parse_amount, parse_token, require_kind};
use crate::command::{Command, CommandReceipt, NamedCommand, ResolvedInputs};
use crate::context::ExecutionContext;
use crate::error::{BuildError, ExecutionError};
use async_trait::async_trait;
use serde::Deserialize;
use wallet_types::{Address, AddressKind, CallData, ChainAddress, Intent, Transaction};

#[derive(Debug, Deserialize)]
struct DepositParams {
    #[serde(default)]
    custody: Option<String>,
    amount: String,
    #[serde(default)]
    token: Option<String>,
}

/// Deposit from the bound address into a custody contract.
///
/// A smart account may omit `custody` and deposit into its companion.
#[derive(Debug)]
pub struct DepositToCsucCommand {
    depositor: Address,
    custody: Address,
    amount: u128,
    token: Option<ChainAddress>,
    intent: Option<Intent>,
}

impl DepositToCsucCommand {
    pub fn new(
        depositor: Address,
        custody: Address,
        amount: u128,
        token: Option<ChainAddress>,
    ) -> Result<Self, BuildError> {
        require_kind(
            Self::NAME,
            &depositor,
            &[AddressKind::Custody, AddressKind::SmartAccount],
        )?;
        require_kind(Self::NAME, &custody, &[AddressKind::Custody])?;
        if amount == 0 {
            return Err(BuildError::invalid_intent(Self::NAME, "amount must be positive"));
        }
        Ok(Self {
            depositor,
            custody,
            amount,
            token,
            intent: None,
        })
    }
}

impl NamedCommand for DepositToCsucCommand {
    const NAME: &'static str = "deposit-to-csuc";

    fn build(address: Address, intent: Option<Intent>) -> Result<Self, BuildError> {
        let params: DepositParams = decode_intent(Self::NAME, intent.as_ref())?;
        let custody = match (params.custody, address.companion()) {
            (Some(raw), _) => Address::custody(raw),
            (None, Some(companion)) => companion.clone(),
            (None, None) => {
                return Err(BuildError::invalid_intent(
                    Self::NAME,
                    "custody is required unless depositing from a smart account",
                ))
            }
        };
        let amount = parse_amount(Self::NAME, &params.amount)?;
        let token = parse_token(Self::NAME, params.token.as_deref())?;

        let mut command = Self::new(address, custody, amount, token)?;
        command.intent = intent;
        Ok(command)
    }
}

#[async_trait]
impl Command for DepositToCsucCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn address(&self) -> &Address {
        &self.depositor
    }

    fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    fn dependencies(&self) -> Vec<Address> {
        vec![self.custody.clone()]
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        let from = inputs.address.address;
        let custody = inputs.dependency(0)?.address;
        let transaction = Transaction {
            from,
            to: custody,
            value: if self.token.is_none() { self.amount } else { 0 },
            call: CallData::DepositToCustody {
                custody,
                token: self.token,
                amount: self.amount,
            },
        };
        let receipt = ctx.broadcast(&transaction).await?;
        Ok(CommandReceipt::new(Self::NAME, from).with_transaction(receipt))
    }
}
