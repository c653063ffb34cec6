//! Execution engine: walks a plan tree and produces its result tree
//!
//! The engine never fails as a whole. Every run-time failure is contained in
//! the [`PlanReport`], attached to the leaf that produced it.
//!
//! ## Composition rules
//!
//! - **Leaf**: resolve the bound address, then each dependency in declared
//!   order. A resolution failure fails the leaf without calling `execute`.
//! - **Series**: children run in declared order; after the first failure the
//!   remaining siblings are skipped as whole subtrees.
//! - **Parallel**: children run concurrently, up to `max_parallel_branches`
//!   at a time, and every child reaches a terminal state. One failing child
//!   does not stop the others.
//!
//! Cancellation skips nodes that have not started yet and abandons in-flight
//! resolutions. In-flight commands observe the token themselves.

use crate::command::{Command, CommandReceipt, ResolvedInputs};
use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::ExecutionError;
use crate::journal::ExecutionJournal;
use crate::plan::{Plan, PlanNode};
use crate::result::{
    CommandOutcome, Failure, NodePath, NodeResult, NodeStatus, PlanReport, RunId, RunStatus,
    SkipReason,
};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use wallet_types::{Address, ResolutionError, ResolvedAddress};

#[derive(Clone, Debug, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

impl ExecutionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run `plan` to completion against `ctx`.
    ///
    /// Each call is an independent run with its own journal. Runs share no
    /// mutable state beyond the resolve-once caches of the addresses they
    /// reference.
    pub async fn execute(&self, plan: &Plan, ctx: &ExecutionContext) -> PlanReport {
        let run_id = RunId::generate();
        let started_at = Utc::now();
        tracing::info!(
            plan_id = %plan.id.short(),
            run_id = %run_id.short(),
            leaves = plan.leaf_count(),
            "Plan execution started"
        );

        let run = Run {
            config: &self.config,
            ctx,
            journal: ExecutionJournal::new(),
        };
        let root = run.node(&plan.root, NodePath::root()).await;
        let status = RunStatus::from(root.status);

        let report = PlanReport {
            plan_id: plan.id.clone(),
            run_id,
            status,
            root,
            journal: run.journal.into_entries(),
            started_at,
            finished_at: Utc::now(),
        };

        let counts = report.counts();
        tracing::info!(
            plan_id = %report.plan_id.short(),
            run_id = %report.run_id.short(),
            status = ?report.status,
            succeeded = counts.succeeded,
            failed = counts.failed,
            skipped = counts.skipped,
            duration_ms = report.duration().num_milliseconds(),
            "Plan execution finished"
        );
        report
    }
}

/// State of one run
struct Run<'a> {
    config: &'a EngineConfig,
    ctx: &'a ExecutionContext,
    journal: ExecutionJournal,
}

impl Run<'_> {
    fn node<'r>(&'r self, node: &'r PlanNode, path: NodePath) -> BoxFuture<'r, NodeResult> {
        async move {
            if self.ctx.is_cancelled() {
                return self.skip(node, path, SkipReason::Cancelled);
            }

            self.record(&path, NodeStatus::Pending, NodeStatus::Running);
            let result = match node {
                PlanNode::Leaf(command) => self.leaf(command.as_ref(), path).await,
                PlanNode::Series(children) => self.series(children, path).await,
                PlanNode::Parallel(children) => self.parallel(children, path).await,
            };
            self.record(&result.path, NodeStatus::Running, result.status);
            result
        }
        .boxed()
    }

    async fn leaf(&self, command: &dyn Command, path: NodePath) -> NodeResult {
        let outcome = match self.resolve_inputs(command).await {
            Err(e) => CommandOutcome::Failed(Failure::Resolution(e)),
            Ok(inputs) => match self.invoke(command, &inputs).await {
                Ok(receipt) => CommandOutcome::Succeeded(receipt),
                Err(e) => CommandOutcome::Failed(Failure::Execution(e)),
            },
        };

        if let CommandOutcome::Failed(failure) = &outcome {
            tracing::warn!(
                node = %path,
                command = command.name(),
                address = %command.address(),
                error = %failure,
                "Command failed"
            );
        }
        NodeResult::leaf(path, command.name(), outcome)
    }

    async fn series(&self, children: &[PlanNode], path: NodePath) -> NodeResult {
        let mut results = Vec::with_capacity(children.len());
        let mut failed = false;

        for (i, child) in children.iter().enumerate() {
            let child_path = path.child(i);
            if failed {
                results.push(self.skip(child, child_path, SkipReason::PriorFailure));
                continue;
            }
            let result = self.node(child, child_path).await;
            failed = result.status == NodeStatus::Failed;
            results.push(result);
        }

        NodeResult::series(path, results)
    }

    async fn parallel(&self, children: &[PlanNode], path: NodePath) -> NodeResult {
        let limit = self.config.max_parallel_branches.max(1);
        // `buffered` keeps declaration order in the output
        let branches: Vec<BoxFuture<'_, NodeResult>> = children
            .iter()
            .enumerate()
            .map(|(i, child)| self.node(child, path.child(i)))
            .collect();
        let results: Vec<NodeResult> = stream::iter(branches)
            .buffered(limit)
            .collect()
            .await;

        NodeResult::parallel(path, results)
    }

    async fn resolve_inputs(&self, command: &dyn Command) -> Result<ResolvedInputs, ResolutionError> {
        let address = self.resolve(command.address()).await?;
        let mut dependencies = Vec::new();
        for dependency in command.dependencies() {
            dependencies.push(self.resolve(&dependency).await?);
        }
        Ok(ResolvedInputs {
            address,
            dependencies,
        })
    }

    /// Resolve with a per-attempt timeout, retrying transient failures
    async fn resolve(&self, address: &Address) -> Result<ResolvedAddress, ResolutionError> {
        let attempts = self.config.resolve_attempts.max(1);
        let cancellation = self.ctx.cancellation();
        let mut attempt = 1;

        loop {
            let result = tokio::select! {
                biased;
                _ = cancellation.cancelled() => Err(ResolutionError::Cancelled),
                resolved = tokio::time::timeout(
                    self.config.resolve_timeout(),
                    address.resolve(self.ctx.collaborators()),
                ) => resolved.unwrap_or_else(|_| {
                    Err(ResolutionError::Timeout(self.config.resolve_timeout_ms))
                }),
            };

            match result {
                Err(e) if e.is_transient() && attempt < attempts => {
                    tracing::warn!(
                        address = %address,
                        attempt,
                        attempts,
                        error = %e,
                        "Transient resolution failure, retrying"
                    );
                    attempt += 1;
                    tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => return Err(ResolutionError::Cancelled),
                        _ = tokio::time::sleep(self.config.resolve_backoff()) => {}
                    }
                }
                other => return other,
            }
        }
    }

    /// Call the command once. Never retried: a broadcast may already be out.
    async fn invoke(
        &self,
        command: &dyn Command,
        inputs: &ResolvedInputs,
    ) -> Result<CommandReceipt, ExecutionError> {
        if self.ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        tracing::debug!(command = command.name(), address = %inputs.address.address, "Executing command");
        tokio::time::timeout(self.config.execute_timeout(), command.execute(self.ctx, inputs))
            .await
            .unwrap_or_else(|_| Err(ExecutionError::Timeout(self.config.execute_timeout_ms)))
    }

    fn skip(&self, node: &PlanNode, path: NodePath, reason: SkipReason) -> NodeResult {
        tracing::debug!(node = %path, %reason, "Skipping subtree");
        let result = NodeResult::skipped(path, node, reason);
        self.record_skipped(&result);
        result
    }

    fn record_skipped(&self, result: &NodeResult) {
        self.record(&result.path, NodeStatus::Pending, NodeStatus::Skipped);
        for child in result.children() {
            self.record_skipped(child);
        }
    }

    fn record(&self, path: &NodePath, from: NodeStatus, to: NodeStatus) {
        if let Err(e) = self.journal.transition(path, from, to) {
            tracing::error!(error = %e, "Journal rejected node transition");
        }
    }
}
