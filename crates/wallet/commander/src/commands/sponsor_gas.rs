use super::{decode_intent, require_kind, DEFAULT_GAS_LIMIT};
use crate::command::{Command, CommandReceipt, NamedCommand, ResolvedInputs};
use crate::context::ExecutionContext;
use crate::error::{BuildError, ExecutionError};
use async_trait::async_trait;
use serde::Deserialize;
use wallet_types::{Address, AddressKind, CallData, Intent, Transaction};

#[derive(Debug, Deserialize)]
struct SponsorGasParams {
    smart_account: String,
    #[serde(default)]
    gas_limit: Option<u64>,
}

/// The bound custody contract sponsors gas for a smart account bound to it
#[derive(Debug)]
pub struct SponsorGasCommand {
    custody: Address,
    smart_account: Address,
    gas_limit: u64,
    intent: Option<Intent>,
}

impl SponsorGasCommand {
    pub fn new(custody: Address, smart_account: Address, gas_limit: u64) -> Result<Self, BuildError> {
        require_kind(Self::NAME, &custody, &[AddressKind::Custody])?;
        require_kind(Self::NAME, &smart_account, &[AddressKind::SmartAccount])?;
        if smart_account.companion() != Some(&custody) {
            return Err(BuildError::invalid_address(
                Self::NAME,
                format!("{} is not bound to sponsor {}", smart_account, custody),
            ));
        }
        if gas_limit == 0 {
            return Err(BuildError::invalid_intent(Self::NAME, "gas_limit must be positive"));
        }
        Ok(Self {
            custody,
            smart_account,
            gas_limit,
            intent: None,
        })
    }
}

impl NamedCommand for SponsorGasCommand {
    const NAME: &'static str = "sponsor-gas";

    fn build(address: Address, intent: Option<Intent>) -> Result<Self, BuildError> {
        let params: SponsorGasParams = decode_intent(Self::NAME, intent.as_ref())?;
        // The smart account is named relative to the sponsoring custody
        let smart_account = Address::smart_account(params.smart_account, address.clone());

        let mut command = Self::new(
            address,
            smart_account,
            params.gas_limit.unwrap_or(DEFAULT_GAS_LIMIT),
        )?;
        command.intent = intent;
        Ok(command)
    }
}

#[async_trait]
impl Command for SponsorGasCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn address(&self) -> &Address {
        &self.custody
    }

    fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    fn dependencies(&self) -> Vec<Address> {
        vec![self.smart_account.clone()]
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        let custody = inputs.address.address;
        let smart_account = inputs.dependency(0)?.address;
        let transaction = Transaction {
            from: custody,
            to: custody,
            value: 0,
            call: CallData::SponsorGas {
                smart_account,
                gas_limit: self.gas_limit,
            },
        };
        let receipt = ctx.broadcast(&transaction).await?;
        Ok(CommandReceipt::new(Self::NAME, custody).with_transaction(receipt))
    }
}
