use serde::{Deserialize, Serialize};
use std::fmt;

/// Assembly status values shared with the API and build layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssemblyState {
    /// Accepted by the API layer, build not started
    Queued,
    /// Build pipeline is producing the deployment unit
    Building,
    /// Deployment unit is built and awaiting deploy
    Built,
    /// Deploy workflow has started but no stack mutation was acknowledged yet.
    /// Implicit: tracked in memory, never written to the store.
    CreatingStack,
    /// Stack create/update was accepted; provisioning is in progress
    Deploying,
    /// Stack is provisioned and the application endpoint is known
    StartingApp,
    /// Application answers on every requested port
    Ready,
    /// Configuration or structural failure
    Error,
    /// Stack provisioning failed or never reached a terminal state
    ErrorStackCreateFailed,
    /// Stack deletion failed; the record is kept for inspection
    ErrorStackDeleteFailed,
    /// Stack is up but the application never became reachable
    ErrorCodeDeployment,
    /// Teardown in progress; wins over any racing deploy
    Deleting,
}

impl AssemblyState {
    /// Check if this is a terminal state for the current workflow run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ready
                | Self::Error
                | Self::ErrorStackCreateFailed
                | Self::ErrorStackDeleteFailed
                | Self::ErrorCodeDeployment
        )
    }

    /// Check if this is an error state
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Error
                | Self::ErrorStackCreateFailed
                | Self::ErrorStackDeleteFailed
                | Self::ErrorCodeDeployment
        )
    }

    /// Check if a deploy workflow is actively driving this assembly
    pub fn is_active(&self) -> bool {
        matches!(self, Self::CreatingStack | Self::Deploying | Self::StartingApp)
    }

    /// Whether the status writer persists this state
    pub fn is_persisted(&self) -> bool {
        !matches!(self, Self::CreatingStack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Building => "BUILDING",
            Self::Built => "BUILT",
            Self::CreatingStack => "CREATING_STACK",
            Self::Deploying => "DEPLOYING",
            Self::StartingApp => "STARTING_APP",
            Self::Ready => "READY",
            Self::Error => "ERROR",
            Self::ErrorStackCreateFailed => "ERROR_STACK_CREATE_FAILED",
            Self::ErrorStackDeleteFailed => "ERROR_STACK_DELETE_FAILED",
            Self::ErrorCodeDeployment => "ERROR_CODE_DEPLOYMENT",
            Self::Deleting => "DELETING",
        }
    }
}

impl fmt::Display for AssemblyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssemblyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(Self::Queued),
            "BUILDING" => Ok(Self::Building),
            "BUILT" => Ok(Self::Built),
            "CREATING_STACK" => Ok(Self::CreatingStack),
            "DEPLOYING" => Ok(Self::Deploying),
            "STARTING_APP" => Ok(Self::StartingApp),
            "READY" => Ok(Self::Ready),
            "ERROR" => Ok(Self::Error),
            "ERROR_STACK_CREATE_FAILED" => Ok(Self::ErrorStackCreateFailed),
            "ERROR_STACK_DELETE_FAILED" => Ok(Self::ErrorStackDeleteFailed),
            "ERROR_CODE_DEPLOYMENT" => Ok(Self::ErrorCodeDeployment),
            "DELETING" => Ok(Self::Deleting),
            _ => Err(format!("Invalid assembly state: {s}")),
        }
    }
}

/// Default state for new assemblies
impl Default for AssemblyState {
    fn default() -> Self {
        Self::Queued
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(AssemblyState::Ready.is_terminal());
        assert!(AssemblyState::ErrorCodeDeployment.is_terminal());
        assert!(!AssemblyState::Deploying.is_terminal());
        assert!(!AssemblyState::Deleting.is_terminal());
    }

    #[test]
    fn test_creating_stack_is_implicit() {
        assert!(!AssemblyState::CreatingStack.is_persisted());
        assert!(AssemblyState::Deploying.is_persisted());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(
            AssemblyState::ErrorStackCreateFailed.to_string(),
            "ERROR_STACK_CREATE_FAILED"
        );
        assert_eq!(
            "STARTING_APP".parse::<AssemblyState>().unwrap(),
            AssemblyState::StartingApp
        );
        assert!("ready".parse::<AssemblyState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&AssemblyState::ErrorCodeDeployment).unwrap();
        assert_eq!(json, "\"ERROR_CODE_DEPLOYMENT\"");

        let parsed: AssemblyState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, AssemblyState::ErrorCodeDeployment);
    }
}
