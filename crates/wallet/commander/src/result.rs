//! Execution results: a tree isomorphic to the plan
//!
//! Every plan node yields exactly one [`NodeResult`] at the same path, skipped
//! subtrees included. Group statuses roll up from their children:
//!
//! - any child `Failed` → `Failed`
//! - otherwise any child `Skipped` → `Skipped`
//! - otherwise (including an empty group) → `Succeeded`

use crate::command::CommandReceipt;
use crate::error::ExecutionError;
use crate::journal::JournalEntry;
use crate::plan::{PlanId, PlanNode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use wallet_types::ResolutionError;

// ── Node Status ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Skipped,
}

impl NodeStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Skipped)
    }

    /// Legal moves: `Pending → Running`, `Pending → Skipped` and
    /// `Running → {Succeeded, Failed, Skipped}`. Terminal states are final.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Skipped)
                | (Self::Running, Self::Succeeded)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Skipped)
        )
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

// ── Node Path ────────────────────────────────────────────────────────

/// Child-index path from the plan root
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", index)?;
        }
        Ok(())
    }
}

// ── Leaf Outcomes ────────────────────────────────────────────────────

/// Why a leaf failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Failure {
    #[error("address resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("command execution failed: {0}")]
    Execution(#[from] ExecutionError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An earlier sibling in a series failed
    PriorFailure,
    /// The run was cancelled before the node started
    Cancelled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PriorFailure => f.write_str("prior failure"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    Succeeded(CommandReceipt),
    Failed(Failure),
    Skipped(SkipReason),
}

impl CommandOutcome {
    pub fn status(&self) -> NodeStatus {
        match self {
            Self::Succeeded(_) => NodeStatus::Succeeded,
            Self::Failed(_) => NodeStatus::Failed,
            Self::Skipped(_) => NodeStatus::Skipped,
        }
    }

    pub fn receipt(&self) -> Option<&CommandReceipt> {
        match self {
            Self::Succeeded(receipt) => Some(receipt),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }
}

// ── Result Tree ──────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeResultKind {
    Leaf {
        command: String,
        outcome: CommandOutcome,
    },
    Series(Vec<NodeResult>),
    Parallel(Vec<NodeResult>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeResult {
    pub path: NodePath,
    pub status: NodeStatus,
    pub kind: NodeResultKind,
}

/// A failed leaf, located in the result tree
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafFailure<'a> {
    pub path: &'a NodePath,
    pub command: &'a str,
    pub failure: &'a Failure,
}

impl NodeResult {
    pub fn leaf(path: NodePath, command: impl Into<String>, outcome: CommandOutcome) -> Self {
        Self {
            path,
            status: outcome.status(),
            kind: NodeResultKind::Leaf {
                command: command.into(),
                outcome,
            },
        }
    }

    pub fn series(path: NodePath, children: Vec<NodeResult>) -> Self {
        Self {
            path,
            status: rollup(&children),
            kind: NodeResultKind::Series(children),
        }
    }

    pub fn parallel(path: NodePath, children: Vec<NodeResult>) -> Self {
        Self {
            path,
            status: rollup(&children),
            kind: NodeResultKind::Parallel(children),
        }
    }

    /// Result for a subtree that never started: every leaf inside is skipped
    pub fn skipped(path: NodePath, node: &PlanNode, reason: SkipReason) -> Self {
        match node {
            PlanNode::Leaf(command) => {
                Self::leaf(path, command.name(), CommandOutcome::Skipped(reason))
            }
            PlanNode::Series(children) | PlanNode::Parallel(children) => {
                let results: Vec<NodeResult> = children
                    .iter()
                    .enumerate()
                    .map(|(i, child)| Self::skipped(path.child(i), child, reason))
                    .collect();
                let kind = if matches!(node, PlanNode::Series(_)) {
                    NodeResultKind::Series(results)
                } else {
                    NodeResultKind::Parallel(results)
                };
                Self {
                    path,
                    status: NodeStatus::Skipped,
                    kind,
                }
            }
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Succeeded
    }

    pub fn children(&self) -> &[NodeResult] {
        match &self.kind {
            NodeResultKind::Leaf { .. } => &[],
            NodeResultKind::Series(children) | NodeResultKind::Parallel(children) => children,
        }
    }

    /// Command name and outcome of a leaf
    pub fn outcome(&self) -> Option<(&str, &CommandOutcome)> {
        match &self.kind {
            NodeResultKind::Leaf { command, outcome } => Some((command.as_str(), outcome)),
            _ => None,
        }
    }

    /// The first failed child in declaration order.
    ///
    /// For a series this is the child that stopped it.
    pub fn cause(&self) -> Option<&NodeResult> {
        self.children()
            .iter()
            .find(|child| child.status == NodeStatus::Failed)
    }

    /// Every failed leaf in the subtree, in declaration order
    pub fn failures(&self) -> Vec<LeafFailure<'_>> {
        let mut out = Vec::new();
        self.collect_failures(&mut out);
        out
    }

    fn collect_failures<'a>(&'a self, out: &mut Vec<LeafFailure<'a>>) {
        match &self.kind {
            NodeResultKind::Leaf {
                command,
                outcome: CommandOutcome::Failed(failure),
            } => out.push(LeafFailure {
                path: &self.path,
                command,
                failure,
            }),
            NodeResultKind::Leaf { .. } => {}
            NodeResultKind::Series(children) | NodeResultKind::Parallel(children) => {
                for child in children {
                    child.collect_failures(out);
                }
            }
        }
    }

    /// Every leaf result in the subtree, in declaration order
    pub fn leaves(&self) -> Vec<&NodeResult> {
        match &self.kind {
            NodeResultKind::Leaf { .. } => vec![self],
            _ => self.children().iter().flat_map(NodeResult::leaves).collect(),
        }
    }

    pub fn find(&self, path: &NodePath) -> Option<&NodeResult> {
        path.indices()
            .iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    /// Whether this result has the same shape as `node`
    pub fn matches_shape(&self, node: &PlanNode) -> bool {
        match (&self.kind, node) {
            (NodeResultKind::Leaf { command, .. }, PlanNode::Leaf(planned)) => {
                command == planned.name()
            }
            (NodeResultKind::Series(results), PlanNode::Series(children))
            | (NodeResultKind::Parallel(results), PlanNode::Parallel(children)) => {
                results.len() == children.len()
                    && results
                        .iter()
                        .zip(children)
                        .all(|(result, child)| result.matches_shape(child))
            }
            _ => false,
        }
    }
}

fn rollup(children: &[NodeResult]) -> NodeStatus {
    if children.iter().any(|c| c.status == NodeStatus::Failed) {
        NodeStatus::Failed
    } else if children.iter().any(|c| c.status == NodeStatus::Skipped) {
        NodeStatus::Skipped
    } else {
        NodeStatus::Succeeded
    }
}

// ── Plan Report ──────────────────────────────────────────────────────

/// Unique identifier for one execution of a plan
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Succeeded,
    Failed,
    /// Cancelled before anything failed
    Cancelled,
}

impl From<NodeStatus> for RunStatus {
    fn from(root: NodeStatus) -> Self {
        match root {
            NodeStatus::Succeeded => Self::Succeeded,
            NodeStatus::Skipped => Self::Cancelled,
            _ => Self::Failed,
        }
    }
}

/// Leaf outcome tally of a run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[derive(Clone, Debug)]
pub struct PlanReport {
    pub plan_id: PlanId,
    pub run_id: RunId,
    pub status: RunStatus,
    pub root: NodeResult,
    pub journal: Vec<JournalEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PlanReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn failures(&self) -> Vec<LeafFailure<'_>> {
        self.root.failures()
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.root
            .leaves()
            .into_iter()
            .fold(OutcomeCounts::default(), |mut counts, leaf| {
                match leaf.status {
                    NodeStatus::Succeeded => counts.succeeded += 1,
                    NodeStatus::Failed => counts.failed += 1,
                    _ => counts.skipped += 1,
                }
                counts
            })
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
