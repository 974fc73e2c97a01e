use super::deployer::DeploymentOrchestrator;
use crate::error::DeployerResult;
use crate::logging::{log_assembly_operation, log_error, log_stack_operation};
use crate::models::Assembly;
use crate::stack::AbsenceOutcome;
use crate::state_machine::{AssemblyEvent, AssemblyState, AssemblyStateMachine};
use tracing::{info, warn};

/// How a destroy workflow run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// The record is gone and artifact cleanup ran
    Destroyed,
    /// The stack could not be removed; the record is kept for inspection
    Retained { status: AssemblyState },
}

/// Per-assembly results of tearing down a whole plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppTeardown {
    pub destroyed: Vec<i64>,
    pub retained: Vec<i64>,
}

impl DeploymentOrchestrator {
    /// Tear down an assembly's stack, then its record and artifacts
    pub async fn destroy_assembly(&self, assembly_id: i64) -> DeployerResult<DestroyOutcome> {
        let assembly = self.context.assemblies.get_by_id(assembly_id).await?;
        let mut machine = AssemblyStateMachine::new(
            assembly.id,
            assembly.status,
            self.context.assemblies.clone(),
        );
        machine.transition(AssemblyEvent::Delete).await?;

        let assembly_uuid = assembly.uuid.to_string();
        log_assembly_operation(
            "destroy",
            assembly.id,
            Some(assembly_uuid.as_str()),
            AssemblyState::Deleting.as_str(),
            None,
        );

        let component = match self
            .context
            .components
            .find_stack_component(assembly.id)
            .await
        {
            Ok(component) => component,
            Err(err) => {
                return self
                    .retain(&mut machine, format!("error reading stack component: {err}"))
                    .await
            }
        };

        let Some(component) = component else {
            info!(assembly_id, "No stack recorded, destroying assembly directly");
            return self.remove(&assembly).await;
        };

        let stack_name = assembly.stack_name();
        match self.context.stack_client.delete(&component.stack_id).await {
            Ok(()) => log_stack_operation(
                "delete",
                assembly.id,
                Some(component.stack_id.as_str()),
                &stack_name,
                None,
            ),
            Err(err) if err.is_not_found() => {
                warn!(
                    assembly_id,
                    stack_id = %component.stack_id,
                    "⚠️ Stack already gone"
                );
                return self.remove(&assembly).await;
            }
            Err(err) => {
                return self
                    .retain(&mut machine, format!("error deleting stack: {err}"))
                    .await
            }
        }

        match self.context.stack_poller().await_absence(&stack_name).await {
            AbsenceOutcome::Absent { .. } => self.remove(&assembly).await,
            AbsenceOutcome::StillPresent { attempts } => {
                self.retain(
                    &mut machine,
                    format!("stack {stack_name} still present after {attempts} checks"),
                )
                .await
            }
        }
    }

    /// Destroy every assembly of a plan, then the plan itself
    pub async fn destroy_app(&self, plan_id: i64) -> DeployerResult<AppTeardown> {
        let plan = self.context.plans.get_by_id(plan_id).await?;
        let assemblies = self.context.assemblies.list_by_plan(plan.id).await?;
        info!(plan_id, assemblies = assemblies.len(), "🧹 Destroying application");

        let mut teardown = AppTeardown::default();
        for assembly in assemblies {
            match self.destroy_assembly(assembly.id).await {
                Ok(DestroyOutcome::Destroyed) => teardown.destroyed.push(assembly.id),
                Ok(DestroyOutcome::Retained { .. }) => teardown.retained.push(assembly.id),
                Err(err) => {
                    log_error(
                        "deployer",
                        "destroy_app",
                        &err.to_string(),
                        Some(format!("assembly_id={}", assembly.id).as_str()),
                    );
                    teardown.retained.push(assembly.id);
                }
            }
        }

        self.context.plans.destroy(plan.id).await?;
        Ok(teardown)
    }

    async fn remove(&self, assembly: &Assembly) -> DeployerResult<DestroyOutcome> {
        self.context.assemblies.destroy(assembly.id).await?;
        info!(assembly_id = assembly.id, "🗑️ Assembly destroyed");

        if let Err(err) = self.cleaner.cleanup(assembly).await {
            log_error(
                "deployer",
                "cleanup_artifacts",
                &err.to_string(),
                Some(format!("assembly_id={}", assembly.id).as_str()),
            );
        }
        Ok(DestroyOutcome::Destroyed)
    }

    async fn retain(
        &self,
        machine: &mut AssemblyStateMachine,
        reason: String,
    ) -> DeployerResult<DestroyOutcome> {
        let status = machine.transition(AssemblyEvent::DeleteFailed).await?;
        log_error(
            "deployer",
            "destroy",
            &reason,
            Some(format!("assembly_id={} status={status}", machine.assembly_id()).as_str()),
        );
        Ok(DestroyOutcome::Retained { status })
    }
}
