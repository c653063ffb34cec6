//! Per-run execution context handed to every command

use crate::error::ExecutionError;
use tokio_util::sync::CancellationToken;
use wallet_types::{ChainTransport, Collaborators, CryptoEngine, Transaction, TxReceipt};

/// Collaborators plus the run's cancellation signal.
///
/// Each plan run holds its own context; concurrent runs never share one.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    collaborators: Collaborators,
    cancellation: CancellationToken,
}

impl ExecutionContext {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn transport(&self) -> &dyn ChainTransport {
        self.collaborators.transport.as_ref()
    }

    pub fn crypto(&self) -> &dyn CryptoEngine {
        self.collaborators.crypto.as_ref()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Request cancellation of the run using this context
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Submit a transaction unless the run was cancelled.
    ///
    /// Once a broadcast is sent it cannot be recalled, so this is the last
    /// point at which a command honours cancellation.
    pub async fn broadcast(&self, transaction: &Transaction) -> Result<TxReceipt, ExecutionError> {
        if self.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        tracing::debug!(
            from = %transaction.from,
            to = %transaction.to,
            call = transaction.call.name(),
            "Broadcasting transaction"
        );
        Ok(self.collaborators.transport.broadcast(transaction).await?)
    }
}
