//! Shell session integration tests.
//!
//! These drive a real child process through the bundled bash companion
//! script. The fish variants at the bottom need fish installed and are
//! ignored by default. CI installs fish and runs them with
//! `cargo test -- --include-ignored`.

use std::time::Duration;

use shell_driver::{Command, RunnerState, Shell, ShellConfig, ShellError, StreamKind};

fn bash_config() -> ShellConfig {
    ShellConfig::new(
        "bash",
        concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/repl.bash"),
    )
}

fn bash() -> Shell {
    Shell::launch(bash_config()).expect("failed to launch bash")
}

// ============================================================================
// Basic Framing
// ============================================================================

#[tokio::test]
async fn test_echo_stdout() {
    let mut shell = bash();
    let result = shell.run("echo 1").await.unwrap();

    assert_eq!(result.stdout, b"1\n");
    assert_eq!(result.stderr, b"");
    assert_eq!(result.status, 0);

    shell.shutdown().unwrap();
}

#[tokio::test]
async fn test_echo_stderr() {
    let mut shell = bash();
    let result = shell.run("echo 1 >&2").await.unwrap();

    assert_eq!(result.stdout, b"");
    assert_eq!(result.stderr, b"1\n");
    assert_eq!(result.status, 0);
}

#[tokio::test]
async fn test_false_status() {
    let mut shell = bash();
    let result = shell.run("false").await.unwrap();

    assert_eq!(result.status, 1);
    assert!(result.stdout.is_empty());
    assert!(result.stderr.is_empty());
    assert!(!result.success());
}

#[tokio::test]
async fn test_explicit_status() {
    let mut shell = bash();
    let result = shell.run("(exit 42)").await.unwrap();
    assert_eq!(result.status, 42);
}

#[tokio::test]
async fn test_arbitrary_bytes_preserved() {
    let mut shell = bash();
    // Every byte value except the sentinel.
    let result = shell
        .run(r"for i in $(seq 1 255); do printf \\$(printf '%03o' $i); done")
        .await
        .unwrap();

    let expected: Vec<u8> = (1..=255u8).collect();
    assert_eq!(result.stdout, expected);
}

#[tokio::test]
async fn test_bytes_command() {
    let mut shell = bash();
    let result = shell.run(b"printf 'raw'".to_vec()).await.unwrap();
    assert_eq!(result.stdout, b"raw");
}

// ============================================================================
// Session State
// ============================================================================

#[tokio::test]
async fn test_variables_persist() {
    let mut shell = bash();

    let set = shell.run("foo=bar").await.unwrap();
    assert_eq!(set.stdout, b"");
    assert_eq!(set.stderr, b"");
    assert_eq!(set.status, 0);

    let echo = shell.run("echo $foo").await.unwrap();
    assert_eq!(echo.stdout, b"bar\n");
}

#[tokio::test]
async fn test_working_directory_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let mut shell = bash();

    shell
        .run(format!("cd '{}'", canonical.display()))
        .await
        .unwrap();
    let pwd = shell.run("pwd -P").await.unwrap();

    assert_eq!(pwd.stdout_text().trim_end(), canonical.to_str().unwrap());
}

#[tokio::test]
async fn test_configured_working_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let mut shell = Shell::launch(bash_config().working_dir(&canonical)).unwrap();

    let pwd = shell.run("pwd -P").await.unwrap();
    assert_eq!(pwd.stdout_text().trim_end(), canonical.to_str().unwrap());
}

// ============================================================================
// Ordering and Attribution
// ============================================================================

#[tokio::test]
async fn test_no_cross_attribution() {
    let mut shell = bash();

    for k in 0..100 {
        let result = shell
            .run(format!("echo out-{k}; echo err-{k} >&2; (exit $(({k} % 3)))"))
            .await
            .unwrap();

        assert_eq!(result.stdout_text(), format!("out-{k}\n"));
        assert_eq!(result.stderr_text(), format!("err-{k}\n"));
        assert_eq!(result.status, k % 3);
    }
    assert_eq!(shell.execution_count(), 100);
}

#[tokio::test]
async fn test_stderr_written_first() {
    let mut shell = bash();
    let result = shell
        .run("echo first >&2; sleep 0.05; echo second")
        .await
        .unwrap();

    assert_eq!(result.stdout, b"second\n");
    assert_eq!(result.stderr, b"first\n");
    assert_eq!(shell.state(), RunnerState::Idle);
}

#[tokio::test]
async fn test_large_output_no_deadlock() {
    let mut shell = bash();
    let result = shell
        .run("head -c 1000000 /dev/zero | tr '\\0' o; head -c 500000 /dev/zero | tr '\\0' e >&2")
        .await
        .unwrap();

    assert_eq!(result.stdout.len(), 1_000_000);
    assert!(result.stdout.iter().all(|&b| b == b'o'));
    assert_eq!(result.stderr.len(), 500_000);
    assert!(result.stderr.iter().all(|&b| b == b'e'));
}

#[tokio::test]
async fn test_large_frame_linear_time() {
    let mut shell = bash();
    let start = std::time::Instant::now();
    let result = shell
        .run("head -c 16000000 /dev/zero | tr '\\0' o")
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.stdout.len(), 16_000_000);
    assert!(result.stdout.iter().all(|&b| b == b'o'));
    assert!(
        elapsed < Duration::from_secs(30),
        "16 MB of output took {elapsed:?}"
    );
}

#[tokio::test]
async fn test_run_all() {
    let mut shell = bash();
    let results = shell
        .run_all(["x=1", "x=$((x + 1))", "echo $x", "false"])
        .await
        .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(results[2].stdout, b"2\n");
    assert_eq!(results[3].status, 1);
}

#[test]
fn test_run_blocking() {
    let mut shell = bash();
    let result = shell.run_blocking("echo sync").unwrap();
    assert_eq!(result.stdout, b"sync\n");

    let result = shell.run_blocking("echo again >&2").unwrap();
    assert_eq!(result.stderr, b"again\n");
    shell.shutdown().unwrap();
}

// ============================================================================
// Errors and Lifecycle
// ============================================================================

#[test]
fn test_launch_missing_executable() {
    let config = ShellConfig::new(
        "/no/such/interpreter",
        concat!(env!("CARGO_MANIFEST_DIR"), "/scripts/repl.bash"),
    );
    let err = Shell::launch(config).unwrap_err();
    assert!(matches!(err, ShellError::Launch { .. }));
}

#[test]
fn test_launch_missing_script() {
    let err = Shell::launch(ShellConfig::new("bash", "/no/such/repl.bash")).unwrap_err();
    assert!(matches!(err, ShellError::Launch { .. }));
}

#[tokio::test]
async fn test_sentinel_in_command_rejected() {
    let mut shell = bash();
    let err = shell.run(b"echo a\0b".to_vec()).await.unwrap_err();
    assert!(matches!(err, ShellError::InvalidCommand(6)));

    let ok = shell.run("echo still-alive").await.unwrap();
    assert_eq!(ok.stdout, b"still-alive\n");
}

#[tokio::test]
async fn test_timeout_then_not_ready() {
    let mut shell = bash();
    let err = shell
        .run(Command::new("sleep 5").timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ShellError::Timeout {
            stage: RunnerState::AwaitingStdout,
            ..
        }
    ));

    let err = shell.run("echo late").await.unwrap_err();
    assert!(matches!(err, ShellError::NotReady(RunnerState::AwaitingStdout)));

    // Shutdown still cleans up a desynchronized session.
    shell.shutdown().unwrap();
}

#[tokio::test]
async fn test_child_exit_reported() {
    let mut shell = bash();
    let err = shell.run("exit 3").await.unwrap_err();
    assert!(matches!(err, ShellError::StreamClosed(StreamKind::Stdout)));
}

#[tokio::test]
async fn test_shutdown_graceful() {
    let mut shell = bash();
    assert!(shell.pid() > 0);
    shell.run("true").await.unwrap();

    let status = shell.shutdown().unwrap();
    assert!(status.success());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shutdown_on_blocking_thread() {
    let mut shell = bash();
    shell.run("true").await.unwrap();

    let status = tokio::task::spawn_blocking(move || shell.shutdown())
        .await
        .unwrap()
        .unwrap();
    assert!(status.success());
}

#[tokio::test]
async fn test_bundled_bash_script() {
    let mut shell = Shell::launch(ShellConfig::bundled("bash")).unwrap();

    shell.run("foo=bundled").await.unwrap();
    let result = shell.run("echo $foo; echo e >&2").await.unwrap();
    assert_eq!(result.stdout, b"bundled\n");
    assert_eq!(result.stderr, b"e\n");

    shell.shutdown().unwrap();
}

#[tokio::test]
async fn test_independent_sessions() {
    let mut a = bash();
    let mut b = bash();
    assert_ne!(a.id(), b.id());

    a.run("who=a").await.unwrap();
    b.run("who=b").await.unwrap();

    assert_eq!(a.run("echo $who").await.unwrap().stdout, b"a\n");
    assert_eq!(b.run("echo $who").await.unwrap().stdout, b"b\n");
}

// ============================================================================
// Fish Companion Script
// ============================================================================

fn fish() -> Shell {
    Shell::launch(ShellConfig::default()).expect("failed to launch fish")
}

#[tokio::test]
#[ignore] // requires fish
async fn test_fish_basic_protocol() {
    let mut shell = fish();

    let result = shell.run("echo 1").await.unwrap();
    assert_eq!(result.into_parts(), (b"1\n".to_vec(), Vec::new(), 0));

    let result = shell.run("echo 1 >&2").await.unwrap();
    assert_eq!(result.into_parts(), (Vec::new(), b"1\n".to_vec(), 0));

    let result = shell.run("false").await.unwrap();
    assert_eq!(result.status, 1);

    shell.shutdown().unwrap();
}

#[tokio::test]
#[ignore] // requires fish
async fn test_fish_variables_persist() {
    let mut shell = fish();

    let set = shell.run("set foo bar").await.unwrap();
    assert_eq!(set.into_parts(), (Vec::new(), Vec::new(), 0));

    let echo = shell.run("echo $foo").await.unwrap();
    assert_eq!(echo.stdout, b"bar\n");
}

#[tokio::test]
#[ignore] // requires fish
async fn test_fish_no_cross_attribution() {
    let mut shell = fish();

    for k in 0..50 {
        let result = shell
            .run(format!("echo out-{k}; echo err-{k} >&2; sh -c 'exit {}'", k % 3))
            .await
            .unwrap();
        assert_eq!(result.stdout_text(), format!("out-{k}\n"));
        assert_eq!(result.stderr_text(), format!("err-{k}\n"));
        assert_eq!(result.status, k % 3);
    }
}

#[tokio::test]
#[ignore] // requires fish
async fn test_fish_working_directory_persists() {
    let dir = tempfile::TempDir::new().unwrap();
    let canonical = dir.path().canonicalize().unwrap();
    let mut shell = fish();

    shell
        .run(format!("cd '{}'", canonical.display()))
        .await
        .unwrap();
    let pwd = shell.run("pwd -P").await.unwrap();
    assert_eq!(pwd.stdout_text().trim_end(), canonical.to_str().unwrap());
}
