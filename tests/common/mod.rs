//! Shared assertions and fixtures for the integration suites
#![allow(dead_code)]

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use deployer_core::state_machine::AssemblyState;
use std::time::Duration;

/// Paused-clock timers fire on millisecond ticks
pub const TIMER_TOLERANCE: Duration = Duration::from_millis(5);

pub fn assert_duration_close(actual: Duration, expected: Duration, label: &str) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= TIMER_TOLERANCE,
        "{label}: expected {expected:?}, got {actual:?}"
    );
}

/// Timestamp `minutes` before now
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::minutes(minutes)
}

pub fn all_states() -> Vec<AssemblyState> {
    vec![
        AssemblyState::Queued,
        AssemblyState::Building,
        AssemblyState::Built,
        AssemblyState::CreatingStack,
        AssemblyState::Deploying,
        AssemblyState::StartingApp,
        AssemblyState::Ready,
        AssemblyState::Error,
        AssemblyState::ErrorStackCreateFailed,
        AssemblyState::ErrorStackDeleteFailed,
        AssemblyState::ErrorCodeDeployment,
        AssemblyState::Deleting,
    ]
}
