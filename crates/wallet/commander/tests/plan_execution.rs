//! Composition semantics of series and parallel plans.

mod common;

use common::{execution_log, logged, Harness, ScriptedCommand};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tokio_util::sync::CancellationToken;
use wallet_commander::{
    BuildError, CommandOutcome, CommandRegistry, Commander, ExecutionEngine, ExecutionError,
    Failure, NodeStatus, PlanNode, RunStatus, SkipReason,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn commander() -> Commander {
    Commander::new(Arc::new(CommandRegistry::with_builtins()))
}

fn leaf(commander: &Commander, command: ScriptedCommand) -> PlanNode {
    commander.leaf(Box::new(command)).unwrap()
}

fn status_of<'a>(
    report: &'a wallet_commander::PlanReport,
    path: Vec<usize>,
) -> &'a wallet_commander::NodeResult {
    report.root.find(&path.into()).unwrap()
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

#[tokio::test]
async fn series_stops_at_first_failure() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.series([
        leaf(&commander, ScriptedCommand::ok("first", &log)),
        leaf(&commander, ScriptedCommand::failing("second", &log)),
        leaf(&commander, ScriptedCommand::ok("third", &log)),
    ]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.root.status, NodeStatus::Failed);

    let third = status_of(&report, vec![2]);
    assert_eq!(third.status, NodeStatus::Skipped);
    assert_eq!(
        third.outcome().map(|(_, o)| o.skip_reason()),
        Some(Some(SkipReason::PriorFailure))
    );

    let cause = report.root.cause().unwrap();
    assert_eq!(cause.path.to_string(), "1");
    assert_eq!(
        cause.outcome().and_then(|(_, o)| o.failure()),
        Some(&Failure::Execution(ExecutionError::Precondition(
            "second failed".into()
        )))
    );

    assert_eq!(
        logged(&log),
        vec!["start:first", "end:first", "start:second", "end:second"]
    );
}

#[tokio::test]
async fn series_runs_children_in_declared_order() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.series([
        leaf(
            &commander,
            ScriptedCommand::ok("slow", &log).with_delay(Duration::from_millis(30)),
        ),
        leaf(&commander, ScriptedCommand::ok("fast", &log)),
    ]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert!(report.is_success());
    assert_eq!(
        logged(&log),
        vec!["start:slow", "end:slow", "start:fast", "end:fast"]
    );
}

#[tokio::test]
async fn skipped_subtree_keeps_its_shape() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.series([
        leaf(&commander, ScriptedCommand::failing("gate", &log)),
        commander.parallel([
            leaf(&commander, ScriptedCommand::ok("a", &log)),
            commander.series([leaf(&commander, ScriptedCommand::ok("b", &log))]),
        ]),
    ]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert!(report.root.matches_shape(&plan.root));
    let skipped = status_of(&report, vec![1]);
    assert_eq!(skipped.status, NodeStatus::Skipped);
    assert_eq!(skipped.leaves().len(), 2);
    assert!(skipped
        .leaves()
        .iter()
        .all(|leaf| leaf.status == NodeStatus::Skipped));
    assert_eq!(logged(&log), vec!["start:gate", "end:gate"]);
}

// ---------------------------------------------------------------------------
// Parallel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parallel_waits_for_every_child() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.parallel([
        leaf(&commander, ScriptedCommand::failing("one", &log)),
        leaf(
            &commander,
            ScriptedCommand::ok("two", &log).with_delay(Duration::from_millis(40)),
        ),
        leaf(&commander, ScriptedCommand::failing("three", &log)),
    ]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    let failures = report.failures();
    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].command, "one");
    assert_eq!(failures[1].command, "three");

    assert_eq!(status_of(&report, vec![1]).status, NodeStatus::Succeeded);
    assert!(logged(&log).contains(&"end:two".to_string()));
}

#[tokio::test]
async fn parallel_children_run_concurrently() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();
    // Deadlocks unless all three are in flight together
    let barrier = Arc::new(Barrier::new(3));

    let plan = commander.plan(commander.parallel((0..3).map(|i| {
        leaf(
            &commander,
            ScriptedCommand::ok(&format!("branch-{}", i), &log).meeting(barrier.clone()),
        )
    })));

    let report = tokio::time::timeout(
        Duration::from_secs(5),
        ExecutionEngine::default().execute(&plan, &harness.context()),
    )
    .await
    .expect("parallel branches did not overlap");

    assert!(report.is_success());
    let log = logged(&log);
    let first_end = log.iter().position(|e| e.starts_with("end:")).unwrap();
    assert_eq!(first_end, 3);
}

#[tokio::test]
async fn empty_parallel_group_succeeds() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.series([
        leaf(&commander, ScriptedCommand::ok("x", &log)),
        commander.parallel(Vec::<PlanNode>::new()),
    ]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert!(report.is_success());
    let empty = status_of(&report, vec![1]);
    assert_eq!(empty.status, NodeStatus::Succeeded);
    assert!(empty.children().is_empty());
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

fn nested_plan(commander: &Commander, log: &common::ExecutionLog, b_fails: bool) -> PlanNode {
    let b = if b_fails {
        ScriptedCommand::failing("B", log)
    } else {
        ScriptedCommand::ok("B", log)
    };
    commander.series([
        leaf(commander, ScriptedCommand::ok("A", log)),
        commander.parallel([
            leaf(commander, b),
            leaf(
                commander,
                ScriptedCommand::ok("C", log).with_delay(Duration::from_millis(20)),
            ),
        ]),
        leaf(commander, ScriptedCommand::ok("D", log)),
    ])
}

#[tokio::test]
async fn nested_plan_all_succeed() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(nested_plan(&commander, &log, false));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.counts().succeeded, 4);
    assert!(report.failures().is_empty());
}

#[tokio::test]
async fn nested_plan_parallel_failure_aborts_outer_series() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(nested_plan(&commander, &log, true));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(status_of(&report, vec![1]).status, NodeStatus::Failed);
    assert_eq!(status_of(&report, vec![1, 0]).status, NodeStatus::Failed);

    let c = status_of(&report, vec![1, 1]);
    assert_eq!(c.status, NodeStatus::Succeeded);
    assert!(matches!(
        c.outcome(),
        Some(("C", CommandOutcome::Succeeded(_)))
    ));

    let d = status_of(&report, vec![2]);
    assert_eq!(
        d.outcome().and_then(|(_, o)| o.skip_reason()),
        Some(SkipReason::PriorFailure)
    );
    assert!(!logged(&log).contains(&"start:D".to_string()));
}

// ---------------------------------------------------------------------------
// Build errors and cancellation
// ---------------------------------------------------------------------------

#[test]
fn unknown_command_fails_closed() {
    let registry = CommandRegistry::with_builtins();
    let err = registry
        .create("unknown-name", common::custody(1), None)
        .unwrap_err();
    assert_eq!(err, BuildError::UnknownCommand("unknown-name".into()));
}

#[tokio::test]
async fn cancellation_skips_pending_nodes() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();
    let token = CancellationToken::new();
    let ctx = harness.context().with_cancellation(token.clone());

    let plan = commander.plan(commander.series([
        leaf(
            &commander,
            ScriptedCommand::ok("running", &log).with_delay(Duration::from_millis(50)),
        ),
        leaf(&commander, ScriptedCommand::ok("pending", &log)),
    ]));

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        token.cancel();
    });
    let report = ExecutionEngine::default().execute(&plan, &ctx).await;
    canceller.await.unwrap();

    // The in-flight command finishes on its own terms
    assert_eq!(status_of(&report, vec![0]).status, NodeStatus::Succeeded);
    assert_eq!(
        status_of(&report, vec![1])
            .outcome()
            .and_then(|(_, o)| o.skip_reason()),
        Some(SkipReason::Cancelled)
    );
    assert_eq!(report.status, RunStatus::Cancelled);
    assert!(!logged(&log).contains(&"start:pending".to_string()));
}

#[tokio::test]
async fn journal_follows_node_lifecycle() {
    let harness = Harness::new();
    let log = execution_log();
    let commander = commander();

    let plan = commander.plan(commander.series([leaf(
        &commander,
        ScriptedCommand::ok("only", &log),
    )]));
    let report = ExecutionEngine::default()
        .execute(&plan, &harness.context())
        .await;

    let transitions: Vec<(String, NodeStatus, NodeStatus)> = report
        .journal
        .iter()
        .map(|e| (e.path.to_string(), e.from, e.to))
        .collect();
    assert_eq!(
        transitions,
        vec![
            ("root".to_string(), NodeStatus::Pending, NodeStatus::Running),
            ("0".to_string(), NodeStatus::Pending, NodeStatus::Running),
            ("0".to_string(), NodeStatus::Running, NodeStatus::Succeeded),
            ("root".to_string(), NodeStatus::Running, NodeStatus::Succeeded),
        ]
    );
    assert!(report
        .journal
        .windows(2)
        .all(|w| w[0].sequence < w[1].sequence));
}
