//! Error types for the deployer.
//!

use crate::artifacts::{LogStoreError, ObjectStoreError};
use crate::config::ConfigurationError;
use crate::persistence::PersistenceError;
use crate::readiness::ProbeError;
use crate::stack::StackClientError;
use crate::state_machine::StateMachineError;
use crate::templates::{CatalogError, SelectionError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeployerError {
    #[error("Persistence error: {0}")]
    PersistenceError(String),
    #[error("Assembly {0} not found")]
    AssemblyNotFound(i64),
    #[error("Stack error: {0}")]
    StackError(String),
    #[error("Template selection error: {0}")]
    SelectionError(String),
    #[error("Template catalog error: {0}")]
    CatalogError(String),
    #[error("State transition error: {0}")]
    StateTransitionError(String),
    #[error("Readiness probe error: {0}")]
    ProbeError(String),
    #[error("Artifact cleanup error: {0}")]
    CleanupError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl From<PersistenceError> for DeployerError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound { entity, id } if entity == "assembly" => {
                DeployerError::AssemblyNotFound(id)
            }
            other => DeployerError::PersistenceError(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for DeployerError {
    fn from(err: sqlx::Error) -> Self {
        DeployerError::PersistenceError(err.to_string())
    }
}

impl From<StackClientError> for DeployerError {
    fn from(err: StackClientError) -> Self {
        DeployerError::StackError(err.to_string())
    }
}

impl From<SelectionError> for DeployerError {
    fn from(err: SelectionError) -> Self {
        DeployerError::SelectionError(err.to_string())
    }
}

impl From<CatalogError> for DeployerError {
    fn from(err: CatalogError) -> Self {
        DeployerError::CatalogError(err.to_string())
    }
}

impl From<StateMachineError> for DeployerError {
    fn from(err: StateMachineError) -> Self {
        DeployerError::StateTransitionError(err.to_string())
    }
}

impl From<ProbeError> for DeployerError {
    fn from(err: ProbeError) -> Self {
        DeployerError::ProbeError(err.to_string())
    }
}

impl From<ObjectStoreError> for DeployerError {
    fn from(err: ObjectStoreError) -> Self {
        DeployerError::CleanupError(err.to_string())
    }
}

impl From<LogStoreError> for DeployerError {
    fn from(err: LogStoreError) -> Self {
        DeployerError::CleanupError(err.to_string())
    }
}

impl From<ConfigurationError> for DeployerError {
    fn from(err: ConfigurationError) -> Self {
        DeployerError::ConfigurationError(err.to_string())
    }
}

pub type DeployerResult<T> = std::result::Result<T, DeployerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_assembly_maps_to_dedicated_variant() {
        let err: DeployerError = PersistenceError::not_found("assembly", 42).into();
        assert_eq!(err, DeployerError::AssemblyNotFound(42));

        let err: DeployerError = PersistenceError::not_found("image", 7).into();
        assert!(matches!(err, DeployerError::PersistenceError(_)));
    }

    #[test]
    fn test_stack_not_found_message() {
        let err: DeployerError = StackClientError::not_found("app-1234").into();
        assert_eq!(err.to_string(), "Stack error: Stack app-1234 not found");
    }
}
