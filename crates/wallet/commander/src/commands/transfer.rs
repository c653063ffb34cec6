use super::{decode_intent, parse_amount, parse_token, require_kind};
use crate::command::{Command, CommandReceipt, NamedCommand, ResolvedInputs};
use crate::context::ExecutionContext;
use crate::error::{BuildError, ExecutionError};
use async_trait::async_trait;
use serde::Deserialize;
use wallet_types::{
    Address, AddressKind, CallData, ChainAddress, Intent, ResolvedAddress, Transaction,
};

#[derive(Debug, Deserialize)]
struct TransferParams {
    to: String,
    amount: String,
    #[serde(default)]
    token: Option<String>,
}

/// Native or token transfer from the bound address.
///
/// The recipient may be any address kind; it is resolved as a dependency, so
/// a stealth recipient gets a fresh one-time address and the payment carries
/// its ephemeral key as the announcement. A plain `0x` recipient is an
/// external account and needs no deployed code.
#[derive(Debug)]
pub struct TransferCommand {
    from: Address,
    to: Address,
    amount: u128,
    token: Option<ChainAddress>,
    intent: Option<Intent>,
}

impl TransferCommand {
    pub fn new(
        from: Address,
        to: Address,
        amount: u128,
        token: Option<ChainAddress>,
    ) -> Result<Self, BuildError> {
        require_kind(
            Self::NAME,
            &from,
            &[AddressKind::Custody, AddressKind::SmartAccount],
        )?;
        if amount == 0 {
            return Err(BuildError::invalid_intent(Self::NAME, "amount must be positive"));
        }
        Ok(Self {
            from,
            to,
            amount,
            token,
            intent: None,
        })
    }

    pub fn recipient(&self) -> &Address {
        &self.to
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    fn transaction(&self, from: ChainAddress, recipient: &ResolvedAddress) -> Transaction {
        let announcement = recipient.ephemeral_public_key.clone();
        match self.token {
            None => Transaction {
                from,
                to: recipient.address,
                value: self.amount,
                call: CallData::NativeTransfer { announcement },
            },
            Some(token) => Transaction {
                from,
                to: token,
                value: 0,
                call: CallData::TokenTransfer {
                    token,
                    recipient: recipient.address,
                    amount: self.amount,
                    announcement,
                },
            },
        }
    }
}

impl NamedCommand for TransferCommand {
    const NAME: &'static str = "transfer";

    fn build(address: Address, intent: Option<Intent>) -> Result<Self, BuildError> {
        let params: TransferParams = decode_intent(Self::NAME, intent.as_ref())?;
        let to = Address::parse_recipient(&params.to)
            .map_err(|e| BuildError::invalid_intent(Self::NAME, format!("to: {}", e)))?;
        let amount = parse_amount(Self::NAME, &params.amount)?;
        let token = parse_token(Self::NAME, params.token.as_deref())?;

        let mut command = Self::new(address, to, amount, token)?;
        command.intent = intent;
        Ok(command)
    }
}

#[async_trait]
impl Command for TransferCommand {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn address(&self) -> &Address {
        &self.from
    }

    fn intent(&self) -> Option<&Intent> {
        self.intent.as_ref()
    }

    fn dependencies(&self) -> Vec<Address> {
        vec![self.to.clone()]
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        let from = inputs.address.address;
        let recipient = inputs.dependency(0)?;
        let receipt = ctx.broadcast(&self.transaction(from, recipient)).await?;
        Ok(CommandReceipt::new(Self::NAME, from).with_transaction(receipt))
    }
}
