//! Integration tests for batch coordination in report and deploy mode.

use autodeploy_core::fakes::{FakeRunner, MemorySignal, RecordingNotifier, RecordingSink};
use autodeploy_core::{
    BatchCoordinator, DeclarationError, DeployContext, DeployEvent, ProjectDeclaration,
    RuntimeKind,
};
use std::sync::Arc;
use tempfile::TempDir;

struct Batch {
    runner: Arc<FakeRunner>,
    sink: Arc<RecordingSink>,
    signal: Arc<MemorySignal>,
    notifier: Arc<RecordingNotifier>,
    coordinator: BatchCoordinator,
}

fn batch(runner: FakeRunner, signal: MemorySignal, notifier: RecordingNotifier) -> Batch {
    let runner = Arc::new(runner);
    let sink = Arc::new(RecordingSink::new());
    let signal = Arc::new(signal);
    let notifier = Arc::new(notifier);
    let ctx = DeployContext::new(runner.clone(), sink.clone());
    let coordinator = BatchCoordinator::new(ctx, signal.clone(), notifier.clone());
    Batch {
        runner,
        sink,
        signal,
        notifier,
        coordinator,
    }
}

fn interpreted(name: &str, dir: &TempDir) -> ProjectDeclaration {
    let src = dir.path().join(name);
    std::fs::create_dir_all(&src).unwrap();
    ProjectDeclaration::new(name, src, name.to_lowercase(), RuntimeKind::Interpreted)
}

/// Test: report mode lists due projects in order and consumes nothing
#[tokio::test]
async fn test_report_lists_due_projects_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new(),
        MemorySignal::due(["Zeta", "Alpha"]),
        RecordingNotifier::new(),
    );

    let report = b
        .coordinator
        .report(vec![
            Ok(interpreted("Zeta", &dir)),
            Ok(interpreted("Idle", &dir)),
            Ok(interpreted("Alpha", &dir)),
        ])
        .await;

    assert_eq!(report.eligible, vec!["Zeta", "Alpha"]);
    assert!(report.errors.is_empty());
    assert!(b.runner.invocations().is_empty());
    assert!(b.signal.consumed().is_empty());
    assert!(b.signal.is_due("Zeta"));
    assert!(b.notifier.messages().is_empty());
}

/// Test: deploy mode runs only eligible projects and notifies once
#[tokio::test]
async fn test_deploy_runs_eligible_projects_and_notifies() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new().fail("git pull origin c", 1),
        MemorySignal::due(["A", "B", "C"]),
        RecordingNotifier::new(),
    );

    let result = b
        .coordinator
        .deploy(vec![
            Ok(interpreted("A", &dir)),
            Ok(interpreted("Skip", &dir)),
            Ok(interpreted("B", &dir)),
            Ok(interpreted("C", &dir)),
        ])
        .await;

    assert_eq!(result.deployed, vec!["A", "B"]);
    assert_eq!(result.failed, vec!["C"]);
    assert!(result.notified);
    assert_eq!(
        b.notifier.messages(),
        vec!["The following project(s) have been deployed: A, B"]
    );
    assert_eq!(
        b.runner.command_lines(),
        vec!["git pull origin a", "git pull origin b", "git pull origin c"]
    );
    assert_eq!(b.signal.checks(), vec!["A", "Skip", "B", "C"]);
    assert_eq!(
        b.signal.consumed(),
        vec![
            ("A".to_string(), true),
            ("B".to_string(), true),
            ("C".to_string(), false)
        ]
    );
    assert_eq!(result.reports.len(), 3);
}

/// Test: nothing deployed means no notification
#[tokio::test]
async fn test_no_notification_when_nothing_deployed() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new().fail("git", 128),
        MemorySignal::due(["A"]),
        RecordingNotifier::new(),
    );

    let result = b.coordinator.deploy(vec![Ok(interpreted("A", &dir))]).await;

    assert!(result.deployed.is_empty());
    assert!(!result.notified);
    assert!(b.notifier.messages().is_empty());
    assert_eq!(b.signal.consumed(), vec![("A".to_string(), false)]);
}

/// Test: notifier failure is logged and does not change the result
#[tokio::test]
async fn test_notification_failure_is_contained() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new(),
        MemorySignal::due(["A"]),
        RecordingNotifier::failing(),
    );

    let result = b.coordinator.deploy(vec![Ok(interpreted("A", &dir))]).await;

    assert_eq!(result.deployed, vec!["A"]);
    assert!(!result.notified);
    assert_eq!(b.sink.names().last(), Some(&"notify.failed"));
}

/// Test: invalid and duplicate declarations are isolated
#[tokio::test]
async fn test_invalid_declarations_do_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new(),
        MemorySignal::due(["A", "B"]),
        RecordingNotifier::new(),
    );
    let bad = DeclarationError::UnrecognizedRuntime {
        project: "Bad".to_string(),
        value: "cobol".to_string(),
    };

    let result = b
        .coordinator
        .deploy(vec![
            Ok(interpreted("A", &dir)),
            Err(bad),
            Ok(interpreted("A", &dir)),
            Ok(interpreted("B", &dir)),
        ])
        .await;

    assert_eq!(result.deployed, vec!["A", "B"]);
    let names: Vec<_> = result.errors.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Bad", "A"]);
    assert_eq!(b.signal.checks(), vec!["A", "B"]);
    let invalid = b
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, DeployEvent::DeclarationInvalid { .. }))
        .count();
    assert_eq!(invalid, 2);
}

/// Test: an unreadable signal skips only that project
#[tokio::test]
async fn test_signal_error_skips_project() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new(),
        MemorySignal::due(["A", "B"]).broken("A"),
        RecordingNotifier::new(),
    );

    let result = b
        .coordinator
        .deploy(vec![Ok(interpreted("A", &dir)), Ok(interpreted("B", &dir))])
        .await;

    assert_eq!(result.deployed, vec!["B"]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(b.signal.consumed(), vec![("B".to_string(), true)]);
}

/// Test: batch emits finished event with both lists
#[tokio::test]
async fn test_batch_finished_event() {
    let dir = TempDir::new().unwrap();
    let b = batch(
        FakeRunner::new().fail("git pull origin b", 1),
        MemorySignal::due(["A", "B"]),
        RecordingNotifier::new(),
    );

    b.coordinator
        .deploy(vec![Ok(interpreted("A", &dir)), Ok(interpreted("B", &dir))])
        .await;

    let finished = b
        .sink
        .events()
        .into_iter()
        .find(|e| matches!(e, DeployEvent::BatchFinished { .. }))
        .unwrap();
    assert_eq!(
        finished,
        DeployEvent::BatchFinished {
            deployed: vec!["A".to_string()],
            failed: vec!["B".to_string()],
        }
    );
}
