//! # Artifact Cleanup
//!
//! Collaborators holding what a destroyed assembly leaves behind: the built deployment
//! unit in the object store, its image record and the user logs.

use crate::error::{DeployerError, DeployerResult};
use crate::models::Assembly;
use crate::persistence::ImageRepository;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectStoreError {
    #[error("Object {container}/{name} not found")]
    NotFound { container: String, name: String },

    #[error("Object store request failed: {0}")]
    RequestFailed(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LogStoreError {
    #[error("Not authorized to delete logs: {0}")]
    AuthorizationFailure(String),

    #[error("Log deletion failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn delete_object(&self, container: &str, name: &str) -> Result<(), ObjectStoreError>;
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn delete(&self, resource_id: &str) -> Result<(), LogStoreError>;
}

/// Object store keeping `(container, name)` pairs in memory
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeSet<(String, String)>>,
    deleted: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<String>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, container: &str, name: &str) {
        self.objects
            .lock()
            .insert((container.to_string(), name.to_string()));
    }

    pub fn contains(&self, container: &str, name: &str) -> bool {
        self.objects
            .lock()
            .contains(&(container.to_string(), name.to_string()))
    }

    /// Make every later delete fail with `reason`
    pub fn fail_with(&self, reason: impl Into<String>) {
        *self.failure.lock() = Some(reason.into());
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn delete_object(&self, container: &str, name: &str) -> Result<(), ObjectStoreError> {
        if let Some(reason) = self.failure.lock().clone() {
            return Err(ObjectStoreError::RequestFailed(reason));
        }
        let key = (container.to_string(), name.to_string());
        if !self.objects.lock().remove(&key) {
            return Err(ObjectStoreError::NotFound {
                container: key.0,
                name: key.1,
            });
        }
        self.deleted.lock().push(key);
        Ok(())
    }
}

/// Log store recording which resources had their logs removed
#[derive(Debug, Default)]
pub struct InMemoryLogStore {
    deleted: Mutex<Vec<String>>,
    failure: Mutex<Option<LogStoreError>>,
}

impl InMemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_with(&self, error: LogStoreError) {
        *self.failure.lock() = Some(error);
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }
}

#[async_trait]
impl LogStore for InMemoryLogStore {
    async fn delete(&self, resource_id: &str) -> Result<(), LogStoreError> {
        if let Some(err) = self.failure.lock().clone() {
            return Err(err);
        }
        self.deleted.lock().push(resource_id.to_string());
        Ok(())
    }
}

/// Removes a destroyed assembly's deployment unit, image record and logs
pub struct ArtifactCleaner {
    images: Arc<dyn ImageRepository>,
    object_store: Arc<dyn ObjectStore>,
    logs: Arc<dyn LogStore>,
    du_container: String,
}

impl ArtifactCleaner {
    pub fn new(
        images: Arc<dyn ImageRepository>,
        object_store: Arc<dyn ObjectStore>,
        logs: Arc<dyn LogStore>,
        du_container: impl Into<String>,
    ) -> Self {
        Self {
            images,
            object_store,
            logs,
            du_container: du_container.into(),
        }
    }

    /// Clean up after `assembly`, whose record is already gone.
    ///
    /// An object store failure stops the cleanup before the image record and logs are
    /// touched. An authorization failure from the log store is logged and tolerated.
    pub async fn cleanup(&self, assembly: &Assembly) -> DeployerResult<()> {
        if let Some(image_id) = assembly.image_id {
            self.remove_image(assembly, image_id).await?;
        }

        match self.logs.delete(&assembly.logs_resource_id()).await {
            Ok(()) => {
                debug!(assembly_id = assembly.id, "Assembly logs deleted");
                Ok(())
            }
            Err(LogStoreError::AuthorizationFailure(reason)) => {
                warn!(
                    assembly_id = assembly.id,
                    reason = %reason,
                    "⚠️ Not authorized to delete assembly logs"
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn remove_image(&self, assembly: &Assembly, image_id: i64) -> DeployerResult<()> {
        let image = match self.images.get_by_id(image_id).await {
            Ok(image) => image,
            Err(err) if err.is_not_found() => {
                debug!(assembly_id = assembly.id, image_id, "No image record to clean up");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(object_name) = image.du_object_name() {
            if let Err(err) = self
                .object_store
                .delete_object(&self.du_container, object_name)
                .await
            {
                error!(
                    assembly_id = assembly.id,
                    container = %self.du_container,
                    object = object_name,
                    error = %err,
                    "❌ Unable to delete deployment unit from object store"
                );
                return Err(DeployerError::CleanupError(err.to_string()));
            }
            info!(
                assembly_id = assembly.id,
                container = %self.du_container,
                object = object_name,
                "🗑️ Deployment unit deleted"
            );
        }

        self.images.destroy(image.id).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ArtifactCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactCleaner")
            .field("du_container", &self.du_container)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryDeployerStore;
    use crate::state_machine::AssemblyState;
    use chrono::Utc;

    struct Fixture {
        store: Arc<InMemoryDeployerStore>,
        objects: Arc<InMemoryObjectStore>,
        logs: Arc<InMemoryLogStore>,
        cleaner: ArtifactCleaner,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryDeployerStore::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let logs = Arc::new(InMemoryLogStore::new());
        let cleaner = ArtifactCleaner::new(
            store.clone(),
            objects.clone(),
            logs.clone(),
            "deployment_units",
        );
        Fixture {
            store,
            objects,
            logs,
            cleaner,
        }
    }

    fn assembly_with_image(f: &Fixture, docker_image_name: Option<&str>) -> (Assembly, i64) {
        let plan = f.store.create_plan("shop");
        let image = f
            .store
            .create_image("shop", docker_image_name.map(str::to_string));
        let assembly = f.store.create_assembly(
            plan.id,
            "shop",
            AssemblyState::Deleting,
            Some(image.id),
            Utc::now(),
        );
        (assembly, image.id)
    }

    #[tokio::test]
    async fn test_full_cleanup() {
        let f = fixture();
        f.objects.put("deployment_units", "shop-v1.tar");
        let (assembly, image_id) = assembly_with_image(&f, Some("tenant-shop-v1.tar"));

        f.cleaner.cleanup(&assembly).await.unwrap();

        assert_eq!(
            f.objects.deleted(),
            vec![("deployment_units".to_string(), "shop-v1.tar".to_string())]
        );
        assert!(f.store.image(image_id).is_none());
        assert_eq!(f.logs.deleted(), vec![assembly.uuid.to_string()]);
    }

    #[tokio::test]
    async fn test_object_store_failure_stops_cleanup() {
        let f = fixture();
        f.objects.fail_with("swift down");
        let (assembly, image_id) = assembly_with_image(&f, Some("tenant-shop.tar"));

        let result = f.cleaner.cleanup(&assembly).await;

        assert!(matches!(result, Err(DeployerError::CleanupError(_))));
        assert!(f.store.image(image_id).is_some());
        assert!(f.logs.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_image_without_artifact_name_is_still_destroyed() {
        let f = fixture();
        let (assembly, image_id) = assembly_with_image(&f, None);

        f.cleaner.cleanup(&assembly).await.unwrap();

        assert!(f.objects.deleted().is_empty());
        assert!(f.store.image(image_id).is_none());
    }

    #[tokio::test]
    async fn test_log_authorization_failure_is_tolerated() {
        let f = fixture();
        f.logs
            .fail_with(LogStoreError::AuthorizationFailure("expired trust".into()));
        let (assembly, _) = assembly_with_image(&f, None);

        assert!(f.cleaner.cleanup(&assembly).await.is_ok());

        f.logs.fail_with(LogStoreError::Other("backend down".into()));
        let (assembly, _) = assembly_with_image(&f, None);
        assert!(matches!(
            f.cleaner.cleanup(&assembly).await,
            Err(DeployerError::CleanupError(_))
        ));
    }
}
