// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `Policy::run`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering::SeqCst};
use std::time::Duration;

use mulligan::{Policy, retry};
use tokio::time::Instant;

fn failing_until(calls: &Arc<AtomicU32>, succeed_on: u32) -> impl FnMut() -> std::future::Ready<Result<u32, String>> {
    let calls = Arc::clone(calls);
    move || {
        let call = calls.fetch_add(1, SeqCst) + 1;
        let result = if call >= succeed_on {
            Ok(call)
        } else {
            Err(format!("failure on call {call}"))
        };
        std::future::ready(result)
    }
}

#[tokio::test(start_paused = true)]
async fn first_attempt_success_returns_immediately() {
    let calls = Arc::new(AtomicU32::new(0));
    let started = Instant::now();

    let value = Policy::default().run(failing_until(&calls, 1)).await.expect("first attempt succeeds");

    assert_eq!(value, 1);
    assert_eq!(calls.load(SeqCst), 1);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn exhaustion_runs_exactly_max_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = Policy::default().max_attempts(3).base_delay(Duration::from_millis(10));

    let err = policy.run(failing_until(&calls, u32::MAX)).await.expect_err("never succeeds");

    assert_eq!(calls.load(SeqCst), 3);
    assert_eq!(err.attempts(), 3);
    assert_eq!(err.max_attempts(), 3);
    assert_eq!(err.last_error(), "failure on call 3");
}

#[tokio::test(start_paused = true)]
async fn terminal_error_display_references_last_failure() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = Policy::default().max_attempts(2).base_delay(Duration::ZERO);

    let err = policy.run(failing_until(&calls, u32::MAX)).await.expect_err("never succeeds");

    assert_eq!(err.to_string(), "operation failed after 2 of 2 attempts: failure on call 2");
    assert_eq!(err.into_last_error(), "failure on call 2");
}

#[tokio::test(start_paused = true)]
async fn eventual_success_sleeps_the_backoff_schedule() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = Policy::default()
        .max_attempts(5)
        .base_delay(Duration::from_secs(1))
        .backoff_factor(2.0)
        .jitter_factor(0.0);
    let started = Instant::now();

    // Fails twice, so the loop sleeps 1s then 2s before the third attempt wins.
    let value = policy.run(failing_until(&calls, 3)).await.expect("third attempt succeeds");

    assert_eq!(value, 3);
    assert_eq!(calls.load(SeqCst), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn zero_max_attempts_still_runs_once() {
    let calls = Arc::new(AtomicU32::new(0));
    let policy = Policy::default().max_attempts(0);

    let err = policy.run(failing_until(&calls, u32::MAX)).await.expect_err("fails");

    assert_eq!(calls.load(SeqCst), 1);
    assert_eq!(err.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn free_function_uses_default_budget() {
    let calls = Arc::new(AtomicU32::new(0));

    let value = retry(failing_until(&calls, 4)).await.expect("fourth attempt succeeds");

    assert_eq!(value, 4);
    assert_eq!(calls.load(SeqCst), 4);
}
