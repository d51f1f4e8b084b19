#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use recon_batch::BatchExecutionConfig;
use recon_core::ReconConfig;
use recon_scheduler::{
    read_targets, CommandMonitor, CommandScanCycle, MonitorService, ScanCycle, SchedulerError,
};
use tokio_util::sync::CancellationToken;

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

fn write_targets(dir: &Path, name: &str, targets: &[&str]) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, targets.join("\n")).unwrap();
    path
}

// ── read_targets ────────────────────────────────────────────────────

#[tokio::test]
async fn read_targets_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "t.txt", &["# in scope", "a.example", "", "b.example"]);
    assert_eq!(read_targets(&path).await.unwrap(), vec!["a.example", "b.example"]);
}

#[tokio::test]
async fn read_targets_missing_file_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_targets(&dir.path().join("absent.txt")).await.is_err());
}

// ── CommandScanCycle ────────────────────────────────────────────────

#[tokio::test]
async fn scan_cycle_feeds_every_batch_to_command() {
    let dir = tempfile::tempdir().unwrap();
    let targets = ["a.example", "b.example", "c.example", "d.example", "e.example"];
    let path = write_targets(dir.path(), "scan.txt", &targets);
    let out = dir.path().join("seen.txt");

    // batch_size 2, threshold 3: five targets become three sequential batches.
    let cycle = CommandScanCycle::new(
        &path,
        &sh(&format!("cat >> '{}'", out.display())),
        BatchExecutionConfig::new(2, 3),
    )
    .unwrap();

    cycle.run_cycle(CancellationToken::new()).await.unwrap();

    let seen = std::fs::read_to_string(&out).unwrap();
    let seen: Vec<&str> = seen.lines().collect();
    assert_eq!(seen, targets);
}

#[tokio::test]
async fn scan_cycle_below_threshold_is_single_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["a.example", "b.example"]);
    let out = dir.path().join("calls.txt");

    let cycle = CommandScanCycle::new(
        &path,
        &sh(&format!("cat > /dev/null; echo call >> '{}'", out.display())),
        BatchExecutionConfig::new(1, 10),
    )
    .unwrap();
    cycle.run_cycle(CancellationToken::new()).await.unwrap();

    assert_eq!(std::fs::read_to_string(&out).unwrap().lines().count(), 1);
}

#[tokio::test]
async fn failing_command_fails_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["a.example"]);
    let cycle =
        CommandScanCycle::new(&path, &sh("echo boom >&2; exit 3"), BatchExecutionConfig::new(10, 10))
            .unwrap();

    let err = cycle.run_cycle(CancellationToken::new()).await.unwrap_err();
    assert!(format!("{err:#}").contains("boom"), "stderr is carried: {err:#}");
}

#[tokio::test]
async fn all_batches_failing_fails_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["a", "b", "c", "d"]);
    let cycle = CommandScanCycle::new(&path, &sh("exit 1"), BatchExecutionConfig::new(1, 2)).unwrap();

    let err = cycle.run_cycle(CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("all 4 scan batches failed"));
}

#[tokio::test]
async fn partial_batch_failure_still_completes_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["ok-1", "bad", "ok-2", "ok-3"]);
    let cycle = CommandScanCycle::new(
        &path,
        &sh("if grep -q bad; then exit 1; fi"),
        BatchExecutionConfig::new(1, 2),
    )
    .unwrap();

    assert!(cycle.run_cycle(CancellationToken::new()).await.is_ok());
}

#[tokio::test]
async fn batch_timeout_kills_command() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["a", "b", "c"]);
    let config = BatchExecutionConfig::new(1, 1).with_batch_timeout(Duration::from_millis(100));
    let cycle = CommandScanCycle::new(&path, &sh("exec sleep 30"), config).unwrap();

    let started = Instant::now();
    assert!(cycle.run_cycle(CancellationToken::new()).await.is_err());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn cancel_reaches_command_that_never_reads_stdin() {
    let dir = tempfile::tempdir().unwrap();
    // Roughly 250 KB of targets, well past the pipe buffer.
    let targets: Vec<String> = (0..5_000)
        .map(|i| format!("https://host-{i:05}.example/{}", "p".repeat(32)))
        .collect();
    let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
    let path = write_targets(dir.path(), "scan.txt", &refs);

    // Unbatched, so no batch timeout applies.
    let cycle =
        CommandScanCycle::new(&path, &sh("exec sleep 30"), BatchExecutionConfig::new(100, 100_000))
            .unwrap();

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let result = tokio::time::timeout(Duration::from_secs(5), cycle.run_cycle(cancel))
        .await
        .expect("cancellation must interrupt a blocked stdin write");
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn empty_targets_file_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "scan.txt", &["# nothing yet"]);
    let cycle = CommandScanCycle::new(&path, &sh("exit 1"), BatchExecutionConfig::default()).unwrap();
    assert!(cycle.run_cycle(CancellationToken::new()).await.is_ok());
}

#[tokio::test]
async fn missing_targets_file_fails_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let cycle = CommandScanCycle::new(
        dir.path().join("absent.txt"),
        &sh("true"),
        BatchExecutionConfig::default(),
    )
    .unwrap();
    assert!(cycle.run_cycle(CancellationToken::new()).await.is_err());
}

#[test]
fn empty_command_rejected() {
    let err = CommandScanCycle::new("scan.txt", &[], BatchExecutionConfig::default()).unwrap_err();
    assert!(matches!(err, SchedulerError::Config(_)));
}

#[test]
fn invalid_batch_config_rejected() {
    let err = CommandScanCycle::new("scan.txt", &sh("true"), BatchExecutionConfig::new(0, 1))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Batch(_)));
}

#[test]
fn from_config_requires_targets_and_command() {
    let mut config = ReconConfig::default();
    assert!(CommandScanCycle::from_config(&config).unwrap().is_none());

    config.scan.targets_file = Some("scan.txt".into());
    assert!(CommandScanCycle::from_config(&config).unwrap().is_none());

    config.scan.command = sh("true");
    assert!(CommandScanCycle::from_config(&config).unwrap().is_some());

    assert!(CommandMonitor::from_config(&config).unwrap().is_none());
    config.monitor.command = sh("true");
    assert!(CommandMonitor::from_config(&config).unwrap().is_some());
}

// ── CommandMonitor ──────────────────────────────────────────────────

#[tokio::test]
async fn monitor_load_targets_counts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "watch.txt", &["a.example", "b.example", "a.example"]);
    let monitor = CommandMonitor::new(&sh("true")).unwrap();
    assert_eq!(monitor.load_targets(&path).await.unwrap(), 2);
}

#[tokio::test]
async fn monitor_load_targets_rejects_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "watch.txt", &[]);
    let monitor = CommandMonitor::new(&sh("true")).unwrap();
    assert!(monitor.load_targets(&path).await.is_err());
}

#[tokio::test]
async fn monitor_substitutes_targets_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "watch.txt", &["a.example"]);
    let monitor = CommandMonitor::new(&sh("test -f {targets}")).unwrap();
    monitor.set_parent_context(CancellationToken::new());
    assert!(monitor.load_and_monitor_from_sources(&path).await.is_ok());
}

#[tokio::test]
async fn monitor_exit_status_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "watch.txt", &["a.example"]);
    let monitor = CommandMonitor::new(&sh("exit 2")).unwrap();
    monitor.set_parent_context(CancellationToken::new());
    assert!(monitor.load_and_monitor_from_sources(&path).await.is_err());
}

#[tokio::test]
async fn monitor_terminated_on_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_targets(dir.path(), "watch.txt", &["a.example"]);
    let monitor = CommandMonitor::new(&sh("exec sleep 30")).unwrap();
    let parent = CancellationToken::new();
    monitor.set_parent_context(parent.clone());

    let canceller = parent.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        monitor.load_and_monitor_from_sources(&path),
    )
    .await
    .expect("monitor command should be killed on cancel");
    assert!(result.is_ok());
}
