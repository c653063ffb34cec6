//! Plan builder
//!
//! Building is synchronous and never touches collaborators: every leaf is
//! validated structurally as it is added, so an invalid plan never reaches
//! the engine.

use crate::command::{Command, NamedCommand};
use crate::error::BuildError;
use crate::plan::{Plan, PlanNode};
use crate::registry::CommandRegistry;
use std::sync::Arc;
use wallet_types::{Address, Intent};

#[derive(Clone, Debug)]
pub struct Commander {
    registry: Arc<CommandRegistry>,
}

impl Commander {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    /// Builder backed by the process-wide registry
    pub fn global() -> Self {
        Self::new(CommandRegistry::global())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Build a leaf by registered name
    pub fn command(
        &self,
        name: &str,
        address: Address,
        intent: Option<Intent>,
    ) -> Result<PlanNode, BuildError> {
        let command = self.registry.create(name, address, intent)?;
        self.leaf(command)
    }

    /// Build a leaf straight from a command type
    pub fn command_of<C: NamedCommand>(
        &self,
        address: Address,
        intent: Option<Intent>,
    ) -> Result<PlanNode, BuildError> {
        self.leaf(Box::new(C::build(address, intent)?))
    }

    /// Wrap an already-built command after validating it
    pub fn leaf(&self, command: Box<dyn Command>) -> Result<PlanNode, BuildError> {
        command.validate()?;
        tracing::trace!(command = command.name(), address = %command.address(), "Leaf built");
        Ok(PlanNode::Leaf(command))
    }

    pub fn series(&self, nodes: impl IntoIterator<Item = PlanNode>) -> PlanNode {
        PlanNode::Series(nodes.into_iter().collect())
    }

    pub fn parallel(&self, nodes: impl IntoIterator<Item = PlanNode>) -> PlanNode {
        PlanNode::Parallel(nodes.into_iter().collect())
    }

    pub fn plan(&self, root: PlanNode) -> Plan {
        let plan = Plan::new(root);
        tracing::debug!(
            plan_id = %plan.id.short(),
            leaves = plan.leaf_count(),
            depth = plan.depth(),
            "Plan built"
        );
        plan
    }
}

impl Default for Commander {
    fn default() -> Self {
        Self::new(Arc::new(CommandRegistry::with_builtins()))
    }
}
