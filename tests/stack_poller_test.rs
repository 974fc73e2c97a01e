//! Stack status polling timing and budgets on a paused clock.

mod common;

use common::assert_duration_close;
use deployer_core::config::PollPolicy;
use deployer_core::stack::{
    AbsenceOutcome, PollOutcome, StackClientError, StackStatus, StackStatusPoller,
};
use deployer_core::test_helpers::{descriptor, not_found, ScriptedStackClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn policy(max_attempts: u32, growth_factor: f64, max_interval: Option<Duration>) -> PollPolicy {
    PollPolicy {
        max_attempts,
        initial_interval: Duration::from_secs(1),
        growth_factor,
        max_interval,
    }
}

fn waits_between(start: Instant, instants: &[Instant]) -> Vec<Duration> {
    let mut previous = start;
    instants
        .iter()
        .map(|&at| {
            let wait = at - previous;
            previous = at;
            wait
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_intervals_grow_geometrically_until_complete() {
    let client = Arc::new(ScriptedStackClient::new());
    client.complete_on_attempt("s1", 4, "http://10.0.0.5");
    let poller = StackStatusPoller::new(client.clone(), policy(10, 1.5, None));

    let start = Instant::now();
    let outcome = poller.await_terminal("s1").await;

    match outcome {
        PollOutcome::Complete {
            endpoint, attempts, ..
        } => {
            assert_eq!(endpoint, "http://10.0.0.5");
            assert_eq!(attempts, 4);
        }
        other => panic!("expected completion, got {other:?}"),
    }
    assert_eq!(client.get_count(), 4);

    let waits = waits_between(start, &client.get_instants());
    for (i, wait) in waits.iter().enumerate() {
        let expected = Duration::from_secs_f64(1.5f64.powi(i as i32));
        assert_duration_close(*wait, expected, &format!("wait before poll {}", i + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_ceiling_caps_interval_growth() {
    let client = Arc::new(ScriptedStackClient::new());
    client.complete_on_attempt("s1", 4, "http://10.0.0.5");
    let poller = StackStatusPoller::new(
        client.clone(),
        policy(10, 2.0, Some(Duration::from_secs(2))),
    );

    let start = Instant::now();
    poller.await_terminal("s1").await;

    let waits = waits_between(start, &client.get_instants());
    let expected = [1, 2, 2, 2].map(Duration::from_secs);
    assert_eq!(waits.len(), expected.len());
    for (i, (wait, expected)) in waits.iter().zip(expected).enumerate() {
        assert_duration_close(*wait, expected, &format!("wait before poll {}", i + 1));
    }
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion_times_out() {
    let client = Arc::new(ScriptedStackClient::new());
    let poller = StackStatusPoller::new(client.clone(), policy(6, 1.0, None));

    let start = Instant::now();
    let outcome = poller.await_terminal("s1").await;

    assert_eq!(outcome, PollOutcome::Timeout { attempts: 6 });
    assert_eq!(client.get_count(), 6);
    assert_duration_close(start.elapsed(), Duration::from_secs(6), "total wait");
}

#[tokio::test(start_paused = true)]
async fn test_lookup_errors_cost_an_attempt() {
    let client = Arc::new(ScriptedStackClient::new());
    client.push_get(Err(StackClientError::request_failed("gateway timeout")));
    client.push_get(Ok(descriptor("s1", StackStatus::Complete, &["http://10.0.0.5"])));
    let poller = StackStatusPoller::new(client.clone(), policy(10, 1.1, None));

    let outcome = poller.await_terminal("s1").await;

    assert!(matches!(outcome, PollOutcome::Complete { attempts: 2, .. }));
}

#[tokio::test(start_paused = true)]
async fn test_failed_status_ends_polling() {
    let client = Arc::new(ScriptedStackClient::new());
    client.push_get(Ok(descriptor("s1", StackStatus::Failed, &[])));
    let poller = StackStatusPoller::new(client.clone(), policy(10, 1.1, None));

    let outcome = poller.await_terminal("s1").await;

    assert_eq!(
        outcome,
        PollOutcome::Failed {
            status: StackStatus::Failed,
            attempts: 1
        }
    );
    assert_eq!(client.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_complete_without_outputs_is_reported() {
    let client = Arc::new(ScriptedStackClient::new());
    client.push_get(Ok(descriptor("s1", StackStatus::Complete, &[])));
    let poller = StackStatusPoller::new(client, policy(10, 1.1, None));

    let outcome = poller.await_terminal("s1").await;

    assert!(matches!(outcome, PollOutcome::MissingEndpoint { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_absence_is_checked_before_sleeping() {
    let client = Arc::new(ScriptedStackClient::new());
    client.push_get(not_found("stack-shop"));
    let poller = StackStatusPoller::new(client.clone(), policy(10, 1.1, None));

    let start = Instant::now();
    let outcome = poller.await_absence("stack-shop").await;

    assert_eq!(outcome, AbsenceOutcome::Absent { attempts: 1 });
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_stack_still_present_after_budget() {
    let client = Arc::new(ScriptedStackClient::new());
    let poller = StackStatusPoller::new(client.clone(), policy(4, 1.0, None));

    let outcome = poller.await_absence("stack-shop").await;

    assert_eq!(outcome, AbsenceOutcome::StillPresent { attempts: 4 });
    assert_eq!(client.get_count(), 4);
}
