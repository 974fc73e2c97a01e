use super::context::DeployerContext;
use super::endpoint::{application_uri, endpoint_host};
use crate::artifacts::ArtifactCleaner;
use crate::constants::catalog::DU_HANDLING_SCRIPT;
use crate::constants::naming::{COMPONENT_NAME_PREFIX, COMPONENT_TYPE};
use crate::error::DeployerResult;
use crate::logging::{log_assembly_operation, log_error, log_stack_operation};
use crate::models::{Assembly, DeploymentRequest, NewStackComponent};
use crate::readiness::ProbeOutcome;
use crate::stack::{PollOutcome, StackFiles, StackParameters};
use crate::state_machine::{AssemblyEvent, AssemblyState, AssemblyStateMachine};
use crate::templates::bootstrap::template_description;
use crate::templates::{select_parameters, select_template, DeploymentTarget};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a deploy workflow run ended
#[derive(Debug, Clone, PartialEq)]
pub enum DeploymentOutcome {
    /// Every port answered; `superseded` lists the older assemblies torn down
    Ready {
        application_uri: String,
        superseded: Vec<i64>,
    },
    /// The assembly was left in a terminal error status
    Failed {
        status: AssemblyState,
        reason: String,
    },
    /// A teardown claimed the assembly before any stack call was made
    Preempted,
}

impl DeploymentOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// Template and parameters ready to send to the stack backend
struct StackDefinition {
    template: String,
    parameters: StackParameters,
}

/// Drives assemblies through deploy and teardown
pub struct DeploymentOrchestrator {
    pub(super) context: Arc<DeployerContext>,
    pub(super) cleaner: ArtifactCleaner,
}

impl DeploymentOrchestrator {
    pub fn new(context: Arc<DeployerContext>) -> Self {
        let cleaner = context.artifact_cleaner();
        Self { context, cleaner }
    }

    pub fn context(&self) -> &DeployerContext {
        &self.context
    }

    /// Deploy one assembly: create or update its stack, wait for provisioning, probe the
    /// application and, once it is READY, tear down the plan's older READY assemblies.
    ///
    /// Only a failure to load the assembly is returned as an error; every other failure
    /// ends in a terminal status reported through [`DeploymentOutcome::Failed`].
    pub async fn deploy(&self, request: DeploymentRequest) -> DeployerResult<DeploymentOutcome> {
        let assembly = self.context.assemblies.get_by_id(request.assembly_id).await?;
        let assembly_uuid = assembly.uuid.to_string();
        log_assembly_operation(
            "deploy",
            assembly.id,
            Some(assembly_uuid.as_str()),
            assembly.status.as_str(),
            Some(request.image_location.as_str()),
        );

        if assembly.is_deleting() {
            info!(assembly_id = assembly.id, "🛑 Assembly being deleted, skipping deploy");
            return Ok(DeploymentOutcome::Preempted);
        }

        let mut machine = AssemblyStateMachine::new(
            assembly.id,
            assembly.status,
            self.context.assemblies.clone(),
        );
        machine.transition(AssemblyEvent::BeginDeploy).await?;

        let definition = match self.prepare_stack(&assembly, &request).await {
            Ok(definition) => definition,
            Err(reason) => {
                return self
                    .finish(&mut machine, AssemblyEvent::Fail(reason.clone()), reason)
                    .await
            }
        };

        // Last checkpoint before the stack is mutated
        let current = self.context.assemblies.get_by_id(assembly.id).await?;
        if current.is_deleting() {
            info!(
                assembly_id = assembly.id,
                "🛑 Assembly being deleted, returning before stack mutation"
            );
            return Ok(DeploymentOutcome::Preempted);
        }

        let stack_id = match self.submit_stack(&assembly, &definition).await {
            Ok(stack_id) => stack_id,
            Err((event, reason)) => return self.finish(&mut machine, event, reason).await,
        };
        machine.transition(AssemblyEvent::StackSubmitted).await?;

        let endpoint = match self.context.stack_poller().await_terminal(&stack_id).await {
            PollOutcome::Complete { endpoint, .. } => endpoint,
            PollOutcome::MissingEndpoint { .. } => {
                let reason = "container IP address not available".to_string();
                return self
                    .finish(&mut machine, AssemblyEvent::Fail(reason.clone()), reason)
                    .await;
            }
            PollOutcome::Failed { .. } => {
                let reason = "stack creation failure".to_string();
                return self.finish(&mut machine, AssemblyEvent::StackFailed, reason).await;
            }
            PollOutcome::Timeout { attempts } => {
                let reason = format!("stack never reached a terminal state after {attempts} polls");
                return self.finish(&mut machine, AssemblyEvent::StackFailed, reason).await;
            }
        };

        let uri = application_uri(&endpoint, request.ports());
        machine
            .transition_with_uri(AssemblyEvent::StackProvisioned, uri.clone())
            .await?;
        debug!(assembly_id = assembly.id, application_uri = %uri, "Application URI recorded");

        let probe = self
            .context
            .readiness_prober()
            .await_reachable(endpoint_host(&endpoint), request.ports())
            .await;

        match probe {
            Ok(ProbeOutcome::Ready { .. }) => {
                machine.transition(AssemblyEvent::AppReachable).await?;
                log_assembly_operation(
                    "deploy",
                    assembly.id,
                    Some(assembly_uuid.as_str()),
                    AssemblyState::Ready.as_str(),
                    Some(uri.as_str()),
                );
                let superseded = self.destroy_superseded(assembly.id).await;
                Ok(DeploymentOutcome::Ready {
                    application_uri: uri,
                    superseded,
                })
            }
            Ok(ProbeOutcome::Unreachable { pending, .. }) => {
                let reason =
                    format!("unreachable server or port {pending:?}, check the port config");
                self.finish(&mut machine, AssemblyEvent::AppUnreachable, reason).await
            }
            Err(err) => {
                let reason = err.to_string();
                self.finish(&mut machine, AssemblyEvent::Fail(reason.clone()), reason).await
            }
        }
    }

    async fn prepare_stack(
        &self,
        assembly: &Assembly,
        request: &DeploymentRequest,
    ) -> Result<StackDefinition, String> {
        let config = &self.context.config;
        let target =
            DeploymentTarget::from_tags(&config.api.image_format, &config.worker.image_storage)
                .map_err(|e| format!("config error: {e}"))?;

        let template = select_template(target, self.context.catalog.as_ref(), request)
            .map_err(|e| format!("error reading stack template: {e}"))?;
        let mut parameters = select_parameters(target, assembly, request, &config.deployer);

        if target.uses_network_parameters() {
            let network = self
                .context
                .stack_client
                .network_parameters()
                .await
                .map_err(|e| format!("error reading network parameters: {e}"))?;
            parameters.extend(network);
        }

        debug!(
            assembly_id = assembly.id,
            target = ?target,
            parameters = ?parameters,
            "Stack definition prepared"
        );
        Ok(StackDefinition {
            template,
            parameters,
        })
    }

    /// Update the assembly's stack if it has one, otherwise create it and record the
    /// component. Returns the stack id, or the failure event and reason.
    async fn submit_stack(
        &self,
        assembly: &Assembly,
        definition: &StackDefinition,
    ) -> Result<String, (AssemblyEvent, String)> {
        let client = &self.context.stack_client;
        let stack_name = assembly.stack_name();

        let existing = self
            .context
            .components
            .find_stack_component(assembly.id)
            .await
            .map_err(|e| fail(format!("error reading stack component: {e}")))?;

        if let Some(component) = existing {
            client
                .update(
                    &component.stack_id,
                    &stack_name,
                    &definition.template,
                    &definition.parameters,
                )
                .await
                .map_err(|e| fail(format!("error updating stack: {e}")))?;
            log_stack_operation(
                "update",
                assembly.id,
                Some(component.stack_id.as_str()),
                &stack_name,
                None,
            );
            return Ok(component.stack_id);
        }

        let script = self
            .context
            .catalog
            .get_from_contrib(DU_HANDLING_SCRIPT)
            .map_err(|e| fail(format!("error reading {DU_HANDLING_SCRIPT}: {e}")))?;
        let files = StackFiles::from([(DU_HANDLING_SCRIPT.to_string(), script)]);

        let created = client
            .create(&stack_name, &definition.template, &definition.parameters, &files)
            .await
            .map_err(|e| {
                (
                    AssemblyEvent::StackFailed,
                    format!("error creating stack: {e}"),
                )
            })?;
        log_stack_operation(
            "create",
            assembly.id,
            Some(created.id.as_str()),
            &stack_name,
            None,
        );

        let component = NewStackComponent {
            assembly_id: assembly.id,
            name: format!("{COMPONENT_NAME_PREFIX}{}", assembly.name),
            component_type: COMPONENT_TYPE.to_string(),
            description: format!(
                "Stack {}",
                template_description(&definition.template).unwrap_or_default()
            ),
            resource_uri: created.resource_link().unwrap_or_default().to_string(),
            stack_id: created.id.clone(),
        };

        self.context
            .components
            .create_stack_component(component)
            .await
            .map_err(|e| {
                fail(format!(
                    "error recording stack component, assembly may be deleted: {e}"
                ))
            })?;

        Ok(created.id)
    }

    /// Apply a terminal failure event and report it
    async fn finish(
        &self,
        machine: &mut AssemblyStateMachine,
        event: AssemblyEvent,
        reason: String,
    ) -> DeployerResult<DeploymentOutcome> {
        let status = machine.transition(event).await?;
        log_error(
            "deployer",
            "deploy",
            &reason,
            Some(format!("assembly_id={} status={status}", machine.assembly_id()).as_str()),
        );
        Ok(DeploymentOutcome::Failed { status, reason })
    }

    /// Destroy every READY assembly of the same plan created before this one.
    /// Returns the ids a destroy was issued for.
    async fn destroy_superseded(&self, assembly_id: i64) -> Vec<i64> {
        // re-read for the stored created_at
        let assembly = match self.context.assemblies.get_by_id(assembly_id).await {
            Ok(assembly) => assembly,
            Err(err) => {
                warn!(assembly_id, error = %err, "⚠️ Could not reload assembly for blue-green cleanup");
                return Vec::new();
            }
        };

        let earlier = match self
            .context
            .assemblies
            .get_earlier(assembly.plan_id, AssemblyState::Ready, assembly.created_at)
            .await
        {
            Ok(earlier) => earlier,
            Err(err) => {
                warn!(assembly_id, error = %err, "⚠️ Could not list superseded assemblies");
                return Vec::new();
            }
        };

        let mut superseded = Vec::new();
        for old in earlier.into_iter().filter(|a| a.id != assembly.id) {
            info!(
                assembly_id,
                superseded_id = old.id,
                "🔄 Destroying superseded assembly"
            );
            if let Err(err) = self.destroy_assembly(old.id).await {
                log_error(
                    "deployer",
                    "destroy_superseded",
                    &err.to_string(),
                    Some(format!("assembly_id={}", old.id).as_str()),
                );
            }
            superseded.push(old.id);
        }
        superseded
    }
}

fn fail(reason: String) -> (AssemblyEvent, String) {
    (AssemblyEvent::Fail(reason.clone()), reason)
}

impl std::fmt::Debug for DeploymentOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentOrchestrator")
            .field("context", &self.context)
            .finish()
    }
}
