use crate::artifacts::{ArtifactCleaner, LogStore, ObjectStore};
use crate::config::{ConfigManager, DeployerConfig};
use crate::error::{DeployerError, DeployerResult};
use crate::persistence::{
    AssemblyRepository, ComponentRepository, ImageRepository, PgDeployerStore, PlanRepository,
};
use crate::readiness::{ReachabilityCheck, ReadinessProber, TcpReachabilityCheck};
use crate::stack::{StackClient, StackStatusPoller};
use crate::templates::TemplateCatalog;
use std::sync::Arc;
use tracing::info;

/// Shared deployer dependencies and configuration
///
/// Built once at process start and handed to the orchestrator; every collaborator is a
/// trait object so tests can swap in fakes.
pub struct DeployerContext {
    pub config: Arc<DeployerConfig>,
    pub assemblies: Arc<dyn AssemblyRepository>,
    pub components: Arc<dyn ComponentRepository>,
    pub images: Arc<dyn ImageRepository>,
    pub plans: Arc<dyn PlanRepository>,
    pub stack_client: Arc<dyn StackClient>,
    pub catalog: Arc<dyn TemplateCatalog>,
    pub reachability: Arc<dyn ReachabilityCheck>,
    pub object_store: Arc<dyn ObjectStore>,
    pub log_store: Arc<dyn LogStore>,
}

impl std::fmt::Debug for DeployerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeployerContext")
            .field("config", &self.config)
            .field("assemblies", &"Arc<dyn AssemblyRepository>")
            .field("components", &"Arc<dyn ComponentRepository>")
            .field("images", &"Arc<dyn ImageRepository>")
            .field("plans", &"Arc<dyn PlanRepository>")
            .field("stack_client", &"Arc<dyn StackClient>")
            .field("catalog", &"Arc<dyn TemplateCatalog>")
            .field("reachability", &"Arc<dyn ReachabilityCheck>")
            .field("object_store", &"Arc<dyn ObjectStore>")
            .field("log_store", &"Arc<dyn LogStore>")
            .finish()
    }
}

impl DeployerContext {
    /// Build a context around one store implementing every repository trait
    ///
    /// The configuration is validated here so backoff and probe timings derived from it
    /// later cannot fail mid-workflow.
    #[allow(clippy::too_many_arguments)]
    pub fn with_store<S>(
        config: Arc<DeployerConfig>,
        store: Arc<S>,
        stack_client: Arc<dyn StackClient>,
        catalog: Arc<dyn TemplateCatalog>,
        reachability: Arc<dyn ReachabilityCheck>,
        object_store: Arc<dyn ObjectStore>,
        log_store: Arc<dyn LogStore>,
    ) -> DeployerResult<Self>
    where
        S: AssemblyRepository + ComponentRepository + ImageRepository + PlanRepository + 'static,
    {
        config.validate()?;

        Ok(Self {
            config,
            assemblies: store.clone(),
            components: store.clone(),
            images: store.clone(),
            plans: store,
            stack_client,
            catalog,
            reachability,
            object_store,
            log_store,
        })
    }

    /// Validated configuration with structured logging installed into its log directory
    pub fn prepare_config(config_manager: &ConfigManager) -> DeployerResult<Arc<DeployerConfig>> {
        let config = Arc::new(config_manager.config().clone());
        config.validate()?;
        crate::logging::init_structured_logging(&config.deployer.deployer_log_dir);
        Ok(config)
    }

    /// Connect to PostgreSQL per the loaded configuration and probe ports over TCP
    pub async fn from_config_manager(
        config_manager: Arc<ConfigManager>,
        stack_client: Arc<dyn StackClient>,
        catalog: Arc<dyn TemplateCatalog>,
        object_store: Arc<dyn ObjectStore>,
        log_store: Arc<dyn LogStore>,
    ) -> DeployerResult<Self> {
        let config = Self::prepare_config(&config_manager)?;
        info!(
            environment = config_manager.environment(),
            "🔧 Initializing DeployerContext from configuration"
        );

        let store = PgDeployerStore::connect(&config.database.url, config.database.max_connections)
            .await
            .map_err(|e| DeployerError::PersistenceError(format!("Failed to connect: {e}")))?;
        store.ensure_schema().await?;

        let context = Self::with_store(
            config,
            Arc::new(store),
            stack_client,
            catalog,
            Arc::new(TcpReachabilityCheck),
            object_store,
            log_store,
        )?;

        info!("✅ DeployerContext initialized");
        Ok(context)
    }

    pub fn stack_poller(&self) -> StackStatusPoller {
        StackStatusPoller::new(self.stack_client.clone(), self.config.poll_policy())
    }

    pub fn readiness_prober(&self) -> ReadinessProber {
        ReadinessProber::new(self.reachability.clone(), self.config.probe_policy())
    }

    pub fn artifact_cleaner(&self) -> ArtifactCleaner {
        ArtifactCleaner::new(
            self.images.clone(),
            self.object_store.clone(),
            self.log_store.clone(),
            self.config.object_store.du_container.clone(),
        )
    }
}
