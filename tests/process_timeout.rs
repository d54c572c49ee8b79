#![cfg(unix)]

use score_batch::process::{run_captured, Completion, DRAIN_GRACE};
use std::process::Command;
use std::time::{Duration, Instant};

#[test]
fn timeout_reaps_grandchildren_holding_the_pipes() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("echo started; sleep 8; echo done");

    let started = Instant::now();
    let captured = run_captured(&mut cmd, Some(Duration::from_secs(1))).unwrap();
    let elapsed = started.elapsed();

    assert!(matches!(captured.completion, Completion::TimedOut(_)));
    assert!(elapsed < Duration::from_secs(1) + DRAIN_GRACE + Duration::from_secs(2), "took {elapsed:?}");
    assert_eq!(captured.stdout, "started\n");
}

#[test]
fn exited_child_output_is_complete() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("printf out; printf err >&2; exit 4");

    let captured = run_captured(&mut cmd, Some(Duration::from_secs(10))).unwrap();

    let Completion::Exited(status) = captured.completion else {
        panic!("unexpected timeout");
    };
    assert_eq!(status.code(), Some(4));
    assert_eq!(captured.stdout, "out");
    assert_eq!(captured.stderr, "err");
}
