//! Tests for the process runner

use std::path::Path;
use std::time::Duration;

use qualities::adapters::ProcessRunner;
use qualities::core::models::{FailureKind, Termination};
use qualities::core::ports::{Invocation, StageRunner};
use tempfile::TempDir;

fn invocation(cwd: &Path, command: &str, args: &[&str], timeout: Duration) -> Invocation {
    Invocation {
        stage_id: "stage".to_string(),
        command: command.to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        cwd: cwd.to_path_buf(),
        timeout,
    }
}

fn sh(cwd: &Path, script: &str) -> Invocation {
    invocation(cwd, "sh", &["-c", script], Duration::from_secs(10))
}

#[test]
fn test_exit_zero_passes() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let result = runner.execute(&invocation(dir.path(), "true", &[], Duration::from_secs(10))).unwrap();
    assert!(result.passed());
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stage_id, "stage");
}

#[test]
fn test_output_and_exit_code_are_captured() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let result = runner.execute(&sh(dir.path(), "echo out; echo err >&2; exit 3")).unwrap();
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.termination, Termination::Exited { code: 3 });
    assert_eq!(result.stdout, "out\n");
    assert_eq!(result.stderr, "err\n");
    assert_eq!(result.failure(), Some(FailureKind::ExitCode { code: 3 }));
}

#[test]
fn test_runs_in_working_directory() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here\n").unwrap();
    let runner = ProcessRunner::new().unwrap();

    let result = runner.execute(&sh(dir.path(), "cat marker.txt")).unwrap();
    assert!(result.passed());
    assert_eq!(result.stdout, "here\n");
}

#[test]
fn test_hung_process_is_killed_at_limit() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let result = runner
        .execute(&invocation(dir.path(), "sleep", &["5"], Duration::from_millis(200)))
        .unwrap();
    assert_eq!(result.termination, Termination::TimedOut { limit_ms: 200 });
    assert_eq!(result.exit_code, -1);
    assert!(result.duration_ms < 5000);
    assert_eq!(result.failure(), Some(FailureKind::Timeout { limit_ms: 200 }));
}

#[test]
fn test_timeout_keeps_output_written_before_the_limit() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let mut slow = sh(dir.path(), "echo partial; echo warming up >&2; sleep 5");
    slow.timeout = Duration::from_millis(500);
    let result = runner.execute(&slow).unwrap();

    assert_eq!(result.termination, Termination::TimedOut { limit_ms: 500 });
    assert_eq!(result.stdout, "partial\n");
    assert_eq!(result.stderr, "warming up\nkilled after 500ms");
}

#[cfg(unix)]
#[test]
fn test_signal_is_reported() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let result = runner.execute(&sh(dir.path(), "kill -9 $$")).unwrap();
    assert_eq!(result.termination, Termination::Signaled { signal: Some(9) });
    assert!(!result.passed());
}

#[test]
fn test_missing_binary_cannot_start() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    let err = runner
        .execute(&invocation(dir.path(), "qualities-no-such-binary", &[], Duration::from_secs(1)))
        .unwrap_err();
    assert!(format!("{err:#}").contains("qualities-no-such-binary"));
}

#[test]
fn test_empty_command_cannot_start() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();
    assert!(runner.execute(&invocation(dir.path(), "  ", &[], Duration::from_secs(1))).is_err());
}

#[test]
fn test_runner_is_reusable() {
    let dir = TempDir::new().unwrap();
    let runner = ProcessRunner::new().unwrap();

    for code in [0, 1, 0] {
        let result = runner.execute(&sh(dir.path(), &format!("exit {code}"))).unwrap();
        assert_eq!(result.exit_code, code);
    }
}
