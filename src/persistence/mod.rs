//! # Persistence Seams
//!
//! Repository traits for the records the deployer touches. The orchestrator calls these
//! directly and awaits every status write before moving on, so concurrent workflows for
//! the same application observe each other's progress with minimal staleness.
//!
//! Two implementations ship with the crate:
//!
//! - [`memory::InMemoryDeployerStore`] for tests and embedded use
//! - [`postgres::PgDeployerStore`] over a `sqlx::PgPool`

pub mod memory;
pub mod postgres;

use crate::models::{Assembly, AssemblyUpdate, Image, NewStackComponent, Plan, StackComponent};
use crate::state_machine::AssemblyState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryDeployerStore;
pub use postgres::PgDeployerStore;

/// Errors raised by repository implementations
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("{entity} {id} not found")]
    NotFound { entity: String, id: i64 },

    /// Constraint conflict, e.g. the assembly vanished while its component was created
    #[error("Integrity violation: {reason}")]
    IntegrityViolation { reason: String },

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PersistenceError {
    pub fn not_found(entity: impl Into<String>, id: i64) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id,
        }
    }

    pub fn integrity_violation(reason: impl Into<String>) -> Self {
        Self::IntegrityViolation {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

#[async_trait]
pub trait AssemblyRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Assembly>;

    async fn get_by_uuid(&self, uuid: Uuid) -> PersistenceResult<Assembly>;

    /// Apply a partial update and save it before returning
    async fn update_and_save(&self, id: i64, update: &AssemblyUpdate)
        -> PersistenceResult<Assembly>;

    async fn destroy(&self, id: i64) -> PersistenceResult<()>;

    async fn list_by_plan(&self, plan_id: i64) -> PersistenceResult<Vec<Assembly>>;

    /// Assemblies of `plan_id` in `status` created strictly before `created_before`,
    /// oldest first
    async fn get_earlier(
        &self,
        plan_id: i64,
        status: AssemblyState,
        created_before: DateTime<Utc>,
    ) -> PersistenceResult<Vec<Assembly>>;
}

#[async_trait]
pub trait ComponentRepository: Send + Sync {
    /// The assembly's stack component, if a stack was ever created for it
    async fn find_stack_component(
        &self,
        assembly_id: i64,
    ) -> PersistenceResult<Option<StackComponent>>;

    /// Record a newly created stack. Fails with
    /// [`PersistenceError::IntegrityViolation`] when the assembly no longer exists or
    /// already has a stack component.
    async fn create_stack_component(
        &self,
        component: NewStackComponent,
    ) -> PersistenceResult<StackComponent>;
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Image>;

    async fn destroy(&self, id: i64) -> PersistenceResult<()>;
}

#[async_trait]
pub trait PlanRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Plan>;

    async fn destroy(&self, id: i64) -> PersistenceResult<()>;
}
