//! Wallet command planner and executor
//!
//! The commander composes on-chain wallet operations into plan trees and runs
//! them. A plan is built synchronously and validated up front; execution
//! resolves addresses lazily and contains every failure in the report.
//!
//! # Key Principle
//!
//! **Execution never throws.** Whatever happens at run time, the caller gets
//! a [`PlanReport`] whose result tree has exactly the shape of the plan, with
//! each leaf marked succeeded, failed (and why), or skipped (and why).
//!
//! # Architecture
//!
//! - [`Command`]: one unit of work bound to an address and an intent
//! - [`CommandRegistry`]: stable command names mapped to factories
//! - [`Commander`]: builds leaves, `series` and `parallel` groups, and plans
//! - [`ExecutionEngine`]: walks a plan and produces the [`PlanReport`]
//! - [`ExecutionJournal`]: append-only record of node state transitions
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use wallet_commander::{BuildError, Commander, ExecutionContext, ExecutionEngine};
//! use wallet_types::{Address, Collaborators, Intent};
//!
//! # async fn run(collaborators: Collaborators) -> Result<(), BuildError> {
//! let commander = Commander::global();
//! let custody = Address::custody("0x1000000000000000000000000000000000000001");
//! let account = Address::smart_account(
//!     "0x2000000000000000000000000000000000000002",
//!     custody.clone(),
//! );
//!
//! let plan = commander.plan(commander.series([
//!     commander.command(
//!         "sa-sponsor-gas-and-deposit-to-csuc",
//!         account.clone(),
//!         Some(Intent::new().with("amount", json!("1000000"))),
//!     )?,
//!     commander.parallel([
//!         commander.command(
//!             "transfer",
//!             account.clone(),
//!             Some(
//!                 Intent::new()
//!                     .with("to", json!("0x3000000000000000000000000000000000000003"))
//!                     .with("amount", json!("250")),
//!             ),
//!         )?,
//!         commander.command(
//!             "deposit-to-csuc",
//!             account,
//!             Some(Intent::new().with("amount", json!("500"))),
//!         )?,
//!     ]),
//! ]));
//!
//! let report = ExecutionEngine::default()
//!     .execute(&plan, &ExecutionContext::new(collaborators))
//!     .await;
//! for failure in report.failures() {
//!     eprintln!("{} ({}) failed: {}", failure.path, failure.command, failure.failure);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod commander;
pub mod commands;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod journal;
pub mod plan;
pub mod registry;
pub mod result;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use command::{check_address, Command, CommandReceipt, NamedCommand, ResolvedInputs};
pub use commander::Commander;
pub use config::{CommanderConfig, EngineConfig, LoggingConfig};
pub use context::ExecutionContext;
pub use engine::ExecutionEngine;
pub use error::{BuildError, ExecutionError};
pub use journal::{ExecutionJournal, IllegalTransition, JournalEntry};
pub use plan::{Plan, PlanId, PlanNode};
pub use registry::{CommandFactory, CommandRegistry};
pub use result::{
    CommandOutcome, Failure, LeafFailure, NodePath, NodeResult, NodeResultKind, NodeStatus,
    OutcomeCounts, PlanReport, RunId, RunStatus, SkipReason,
};
pub use telemetry::init_tracing;
