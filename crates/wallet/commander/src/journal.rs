//! Append-only record of node state transitions for one run

use crate::result::{NodePath, NodeStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonically increasing sequence number
    pub sequence: u64,
    pub path: NodePath,
    pub from: NodeStatus,
    pub to: NodeStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("node {path}: transition not allowed: {from} -> {to}")]
pub struct IllegalTransition {
    pub path: NodePath,
    pub from: NodeStatus,
    pub to: NodeStatus,
}

/// Shared by every branch of a run; entries are appended in the order
/// transitions happen, so concurrent branches interleave.
#[derive(Debug, Default)]
pub struct ExecutionJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl ExecutionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `from → to` for the node at `path`.
    ///
    /// Illegal transitions are rejected and not recorded.
    pub fn transition(
        &self,
        path: &NodePath,
        from: NodeStatus,
        to: NodeStatus,
    ) -> Result<(), IllegalTransition> {
        if !from.can_transition_to(to) {
            return Err(IllegalTransition {
                path: path.clone(),
                from,
                to,
            });
        }

        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let sequence = entries.len() as u64;
        entries.push(JournalEntry {
            sequence,
            path: path.clone(),
            from,
            to,
            at: Utc::now(),
        });
        tracing::debug!(node = %path, %from, %to, "Node transition");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every entry recorded so far
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_entries(self) -> Vec<JournalEntry> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
