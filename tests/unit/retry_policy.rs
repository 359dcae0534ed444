//! Unit tests for the retry policy

use geo_bulk_fetcher::fetcher::FetchOutcome;
use geo_bulk_fetcher::scheduler::RetryPolicy;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Hands out a fixed sequence of outcomes, one per attempt
#[derive(Clone)]
struct ScriptedOutcomes {
    script: Arc<Mutex<Vec<FetchOutcome<&'static str>>>>,
    calls: Arc<Mutex<u32>>,
}

impl ScriptedOutcomes {
    fn new(mut script: Vec<FetchOutcome<&'static str>>) -> Self {
        script.reverse();
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    fn next(&self) -> FetchOutcome<&'static str> {
        *self.calls.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(FetchOutcome::TransportError("script exhausted".into()))
    }

    fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

fn rate_limited_twice_then_success() -> ScriptedOutcomes {
    ScriptedOutcomes::new(vec![
        FetchOutcome::RateLimited,
        FetchOutcome::RateLimited,
        FetchOutcome::Success("ok"),
    ])
}

#[tokio::test(start_paused = true)]
async fn test_recovers_within_attempt_budget() {
    let script = rate_limited_twice_then_success();
    let policy = RetryPolicy::new(3, Duration::from_millis(500));

    let outcome = policy
        .run("address", |_| {
            let outcome = script.next();
            async move { outcome }
        })
        .await;

    assert_eq!(outcome, FetchOutcome::Success("ok"));
    assert_eq!(script.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_budget_returns_last_outcome() {
    let script = rate_limited_twice_then_success();
    let policy = RetryPolicy::new(2, Duration::from_millis(500));

    let outcome = policy
        .run("address", |_| {
            let outcome = script.next();
            async move { outcome }
        })
        .await;

    assert_eq!(outcome, FetchOutcome::RateLimited);
    assert_eq!(script.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_fixed_delay_between_attempts() {
    let script = ScriptedOutcomes::new(vec![
        FetchOutcome::ServerError(500),
        FetchOutcome::ServerError(502),
        FetchOutcome::ServerError(503),
    ]);
    let policy = RetryPolicy::new(3, Duration::from_secs(2));
    let start = Instant::now();

    let outcome = policy
        .run("address", |_| {
            let outcome = script.next();
            async move { outcome }
        })
        .await;

    assert_eq!(outcome, FetchOutcome::ServerError(503));
    // two gaps, no delay after the final attempt
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test(start_paused = true)]
async fn test_terminal_outcomes_are_not_retried() {
    for terminal in [FetchOutcome::NotFound, FetchOutcome::ClientError(401)] {
        let script = ScriptedOutcomes::new(vec![terminal.clone(), FetchOutcome::Success("late")]);
        let policy = RetryPolicy::new(5, Duration::from_secs(1));

        let outcome = policy
            .run("address", |_| {
                let outcome = script.next();
                async move { outcome }
            })
            .await;

        assert_eq!(outcome, terminal);
        assert_eq!(script.calls(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_attempt_numbers_are_one_based() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let policy = RetryPolicy::new(3, Duration::ZERO);

    let record = seen.clone();
    let _ = policy
        .run("address", move |attempt| {
            record.lock().unwrap().push(attempt);
            async { FetchOutcome::<()>::TransportError("timeout".into()) }
        })
        .await;

    assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_max_attempts_never_below_one() {
    assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    assert_eq!(RetryPolicy::new(1, Duration::from_secs(5)).max_attempts(), 1);
}
