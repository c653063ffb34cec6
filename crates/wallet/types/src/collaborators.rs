//! The external collaborators an address resolves against.

use crate::chain::ChainTransport;
use crate::crypto::CryptoEngine;
use std::fmt;
use std::sync::Arc;

/// Chain transport and crypto engine, shared by every branch of a run
#[derive(Clone)]
pub struct Collaborators {
    pub transport: Arc<dyn ChainTransport>,
    pub crypto: Arc<dyn CryptoEngine>,
}

impl Collaborators {
    pub fn new(transport: Arc<dyn ChainTransport>, crypto: Arc<dyn CryptoEngine>) -> Self {
        Self { transport, crypto }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
