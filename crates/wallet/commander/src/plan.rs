//! Plan trees: commands composed with series/parallel semantics
//!
//! A plan is an owned tree, so it is finite and acyclic by construction.
//! Nothing in it is resolved or executed until the engine walks it.

use crate::command::Command;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};

// ── Plan Identifier ──────────────────────────────────────────────────

/// Unique identifier for a built plan
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub String);

impl PlanId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Plan Node ────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum PlanNode {
    Leaf(Box<dyn Command>),
    /// Children run one after another; the first failure skips the rest
    Series(Vec<PlanNode>),
    /// Children run concurrently and all of them finish
    Parallel(Vec<PlanNode>),
}

impl PlanNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    pub fn children(&self) -> &[PlanNode] {
        match self {
            Self::Leaf(_) => &[],
            Self::Series(children) | Self::Parallel(children) => children,
        }
    }

    pub fn command(&self) -> Option<&dyn Command> {
        match self {
            Self::Leaf(command) => Some(command.as_ref()),
            _ => None,
        }
    }

    /// Number of commands in the subtree
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            _ => self.children().iter().map(PlanNode::leaf_count).sum(),
        }
    }

    /// Height of the subtree; a leaf or empty group has depth 1
    pub fn depth(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(PlanNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Indented outline of the subtree, one node per line
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        // Writing into a String cannot fail
        let _ = match self {
            Self::Leaf(command) => writeln!(out, "{}{} @ {}", pad, command.name(), command.address()),
            Self::Series(children) => writeln!(out, "{}series ({})", pad, children.len()),
            Self::Parallel(children) => writeln!(out, "{}parallel ({})", pad, children.len()),
        };
        for child in self.children() {
            child.describe_into(out, indent + 1);
        }
    }
}

// ── Plan ─────────────────────────────────────────────────────────────

/// A built, immutable plan ready for execution
#[derive(Debug)]
pub struct Plan {
    pub id: PlanId,
    pub root: PlanNode,
    pub created_at: DateTime<Utc>,
}

impl Plan {
    pub fn new(root: PlanNode) -> Self {
        Self {
            id: PlanId::generate(),
            root,
            created_at: Utc::now(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn depth(&self) -> usize {
        self.root.depth()
    }

    pub fn describe(&self) -> String {
        self.root.describe()
    }
}
