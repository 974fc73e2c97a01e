use crate::constants::stack_status;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Template parameters passed on create and update
pub type StackParameters = BTreeMap<String, serde_json::Value>;

/// Extra files shipped with a stack create, keyed by file name
pub type StackFiles = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StackClientError {
    /// The stack does not exist (or no longer exists)
    #[error("Stack {stack} not found")]
    NotFound { stack: String },

    /// Transport, validation or quota failure
    #[error("Stack request failed: {reason}")]
    RequestFailed { reason: String },
}

impl StackClientError {
    pub fn not_found(stack: impl Into<String>) -> Self {
        Self::NotFound {
            stack: stack.into(),
        }
    }

    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type StackClientResult<T> = Result<T, StackClientError>;

/// Provisioning status reported by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackStatus {
    Complete,
    Failed,
    InProgress,
    /// Anything else, including an empty status
    Other(String),
}

impl StackStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl From<&str> for StackStatus {
    fn from(status: &str) -> Self {
        match status {
            stack_status::COMPLETE => Self::Complete,
            stack_status::FAILED => Self::Failed,
            stack_status::IN_PROGRESS => Self::InProgress,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackOutput {
    pub output_key: String,
    pub output_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackLink {
    pub href: String,
    pub rel: String,
}

/// Result of a get-by-id-or-name call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescriptor {
    pub id: String,
    pub name: String,
    pub status: StackStatus,
    pub outputs: Vec<StackOutput>,
}

impl StackDescriptor {
    /// Endpoint published by the stack: the value of its first output
    pub fn endpoint(&self) -> Option<&str> {
        self.outputs.first().map(|o| o.output_value.as_str())
    }
}

/// Acknowledgement of a stack create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedStack {
    pub id: String,
    pub links: Vec<StackLink>,
}

impl CreatedStack {
    pub fn resource_link(&self) -> Option<&str> {
        self.links.first().map(|l| l.href.as_str())
    }
}

/// Adapter over the remote orchestration-stack API.
///
/// Each call is exactly one remote request. Implementations must report a missing stack
/// as [`StackClientError::NotFound`] and everything else as `RequestFailed`.
#[async_trait]
pub trait StackClient: Send + Sync {
    async fn create(
        &self,
        name: &str,
        template: &str,
        parameters: &StackParameters,
        files: &StackFiles,
    ) -> StackClientResult<CreatedStack>;

    async fn update(
        &self,
        stack_id: &str,
        name: &str,
        template: &str,
        parameters: &StackParameters,
    ) -> StackClientResult<()>;

    async fn get(&self, id_or_name: &str) -> StackClientResult<StackDescriptor>;

    async fn delete(&self, stack_id: &str) -> StackClientResult<()>;

    /// Network parameters merged into container deployments
    async fn network_parameters(&self) -> StackClientResult<StackParameters> {
        Ok(StackParameters::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        assert_eq!(StackStatus::from("COMPLETE"), StackStatus::Complete);
        assert_eq!(StackStatus::from("FAILED"), StackStatus::Failed);
        assert_eq!(StackStatus::from("IN_PROGRESS"), StackStatus::InProgress);
        assert_eq!(StackStatus::from(""), StackStatus::Other(String::new()));
        assert!(!StackStatus::from("").is_terminal());
    }

    #[test]
    fn test_endpoint_is_first_output() {
        let descriptor = StackDescriptor {
            id: "s1".to_string(),
            name: "shop-1".to_string(),
            status: StackStatus::Complete,
            outputs: vec![
                StackOutput {
                    output_key: "URL".to_string(),
                    output_value: "http://10.0.0.5".to_string(),
                },
                StackOutput {
                    output_key: "other".to_string(),
                    output_value: "ignored".to_string(),
                },
            ],
        };
        assert_eq!(descriptor.endpoint(), Some("http://10.0.0.5"));
    }

    #[test]
    fn test_error_taxonomy() {
        let err = StackClientError::not_found("app-1234");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Stack app-1234 not found");
        assert!(!StackClientError::request_failed("quota").is_not_found());
    }
}
