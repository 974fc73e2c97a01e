use super::catalog::InMemoryTemplateCatalog;
use super::reachability::ScriptedReachability;
use super::stack::ScriptedStackClient;
use crate::artifacts::{InMemoryLogStore, InMemoryObjectStore};
use crate::config::DeployerConfig;
use crate::error::DeployerResult;
use crate::models::{Assembly, DeploymentRequest, Plan};
use crate::orchestration::{DeployerContext, DeploymentOrchestrator};
use crate::persistence::InMemoryDeployerStore;
use crate::state_machine::AssemblyState;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Configuration with small budgets for workflow tests
pub fn test_config() -> DeployerConfig {
    let mut config = DeployerConfig::default();
    config.deployer.max_attempts = 10;
    config.deployer.du_attempts = 5;
    config.deployer.wait_interval = 1.0;
    config.deployer.growth_factor = 1.1;
    config.deployer.probe_interval_ms = 1000;
    config.deployer.probe_timeout_ms = 100;
    config
}

/// Orchestrator wired to in-memory and scripted collaborators
pub struct DeployerHarness {
    pub config: Arc<DeployerConfig>,
    pub store: Arc<InMemoryDeployerStore>,
    pub stack: Arc<ScriptedStackClient>,
    pub reachability: Arc<ScriptedReachability>,
    pub catalog: Arc<InMemoryTemplateCatalog>,
    pub objects: Arc<InMemoryObjectStore>,
    pub logs: Arc<InMemoryLogStore>,
    pub orchestrator: DeploymentOrchestrator,
}

impl Default for DeployerHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl DeployerHarness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Harness for a configuration known to be valid
    pub fn with_config(config: DeployerConfig) -> Self {
        match Self::try_with_config(config) {
            Ok(harness) => harness,
            Err(err) => panic!("invalid test configuration: {err}"),
        }
    }

    pub fn try_with_config(config: DeployerConfig) -> DeployerResult<Self> {
        let config = Arc::new(config);
        let store = Arc::new(InMemoryDeployerStore::new());
        let stack = Arc::new(ScriptedStackClient::new());
        let reachability = Arc::new(ScriptedReachability::new());
        let catalog = Arc::new(InMemoryTemplateCatalog::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let logs = Arc::new(InMemoryLogStore::new());

        let context = DeployerContext::with_store(
            config.clone(),
            store.clone(),
            stack.clone(),
            catalog.clone(),
            reachability.clone(),
            objects.clone(),
            logs.clone(),
        )?;
        let orchestrator = DeploymentOrchestrator::new(Arc::new(context));

        Ok(Self {
            config,
            store,
            stack,
            reachability,
            catalog,
            objects,
            logs,
            orchestrator,
        })
    }

    pub fn plan(&self, name: &str) -> Plan {
        self.store.create_plan(name)
    }

    /// Assembly of `plan` created now
    pub fn assembly(&self, plan: &Plan, name: &str, status: AssemblyState) -> Assembly {
        self.store
            .create_assembly(plan.id, name, status, None, Utc::now())
    }

    pub fn assembly_at(
        &self,
        plan: &Plan,
        name: &str,
        status: AssemblyState,
        created_at: DateTime<Utc>,
    ) -> Assembly {
        self.store
            .create_assembly(plan.id, name, status, None, created_at)
    }

    pub fn status_of(&self, assembly_id: i64) -> Option<AssemblyState> {
        self.store.assembly(assembly_id).map(|a| a.status)
    }
}

/// Container deploy request for `assembly_id`
pub fn deployment_request(assembly_id: i64, ports: Vec<u16>) -> DeploymentRequest {
    // ports are supplied by the test, always non-empty
    match DeploymentRequest::new(assembly_id, "glance-image-id", "shop-du", ports) {
        Ok(request) => request,
        Err(err) => panic!("invalid test request: {err}"),
    }
}
