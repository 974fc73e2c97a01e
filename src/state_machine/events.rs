use super::errors::{StateMachineError, StateMachineResult};
use super::states::AssemblyState;
use serde::{Deserialize, Serialize};

/// Events that drive assembly status transitions during deploy and teardown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AssemblyEvent {
    /// A deploy workflow picked up the assembly
    BeginDeploy,
    /// The stack backend accepted a create or update
    StackSubmitted,
    /// The stack reached its complete state and published an endpoint
    StackProvisioned,
    /// Every requested port accepted a connection
    AppReachable,
    /// The stack could not be created, failed, or never reached a terminal state
    StackFailed,
    /// The probe budget ran out before all ports answered
    AppUnreachable,
    /// Configuration or structural failure with its reason
    Fail(String),
    /// A teardown was requested
    Delete,
    /// The stack could not be deleted or never disappeared
    DeleteFailed,
}

impl AssemblyEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::BeginDeploy => "begin_deploy",
            Self::StackSubmitted => "stack_submitted",
            Self::StackProvisioned => "stack_provisioned",
            Self::AppReachable => "app_reachable",
            Self::StackFailed => "stack_failed",
            Self::AppUnreachable => "app_unreachable",
            Self::Fail(_) => "fail",
            Self::Delete => "delete",
            Self::DeleteFailed => "delete_failed",
        }
    }

    /// Extract error message if this is a failure event
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Fail(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Transition table for assemblies. Anything not listed is rejected.
///
/// | from | event | to |
/// | --- | --- | --- |
/// | any but DELETING | BeginDeploy | CREATING_STACK |
/// | CREATING_STACK | StackSubmitted | DEPLOYING |
/// | DEPLOYING | StackProvisioned | STARTING_APP |
/// | STARTING_APP | AppReachable | READY |
/// | CREATING_STACK, DEPLOYING | StackFailed | ERROR_STACK_CREATE_FAILED |
/// | STARTING_APP | AppUnreachable | ERROR_CODE_DEPLOYMENT |
/// | CREATING_STACK, DEPLOYING, STARTING_APP | Fail | ERROR |
/// | any | Delete | DELETING |
/// | DELETING | DeleteFailed | ERROR_STACK_DELETE_FAILED |
pub fn determine_target_state(
    current_state: AssemblyState,
    event: &AssemblyEvent,
) -> StateMachineResult<AssemblyState> {
    use AssemblyState as S;

    let target = match (current_state, event) {
        (S::Deleting, AssemblyEvent::BeginDeploy) => {
            return Err(StateMachineError::InvalidTransition {
                from: current_state.to_string(),
                event: event.event_type().to_string(),
            })
        }
        (_, AssemblyEvent::BeginDeploy) => S::CreatingStack,

        (S::CreatingStack, AssemblyEvent::StackSubmitted) => S::Deploying,
        (S::Deploying, AssemblyEvent::StackProvisioned) => S::StartingApp,
        (S::StartingApp, AssemblyEvent::AppReachable) => S::Ready,

        (S::CreatingStack | S::Deploying, AssemblyEvent::StackFailed) => {
            S::ErrorStackCreateFailed
        }
        (S::StartingApp, AssemblyEvent::AppUnreachable) => S::ErrorCodeDeployment,
        (S::CreatingStack | S::Deploying | S::StartingApp, AssemblyEvent::Fail(_)) => S::Error,

        (_, AssemblyEvent::Delete) => S::Deleting,
        (S::Deleting, AssemblyEvent::DeleteFailed) => S::ErrorStackDeleteFailed,

        (from_state, _) => {
            return Err(StateMachineError::InvalidTransition {
                from: from_state.to_string(),
                event: event.event_type().to_string(),
            })
        }
    };

    Ok(target)
}
