use super::{
    errors::StateMachineResult,
    events::{determine_target_state, AssemblyEvent},
    states::AssemblyState,
};
use crate::models::AssemblyUpdate;
use crate::persistence::AssemblyRepository;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Status writer for a single assembly.
///
/// Every event is checked against the transition table before anything is written.
/// Rejected events leave both the in-memory and the stored status untouched. Accepted
/// events are written through the repository unless the target is implicit; a failed
/// write is logged and the workflow keeps its in-memory view.
pub struct AssemblyStateMachine {
    assembly_id: i64,
    current: AssemblyState,
    repository: Arc<dyn AssemblyRepository>,
}

impl AssemblyStateMachine {
    pub fn new(
        assembly_id: i64,
        current: AssemblyState,
        repository: Arc<dyn AssemblyRepository>,
    ) -> Self {
        Self {
            assembly_id,
            current,
            repository,
        }
    }

    pub fn current_state(&self) -> AssemblyState {
        self.current
    }

    pub fn assembly_id(&self) -> i64 {
        self.assembly_id
    }

    /// Apply an event and persist the resulting status
    pub async fn transition(&mut self, event: AssemblyEvent) -> StateMachineResult<AssemblyState> {
        self.apply(event, None).await
    }

    /// Apply an event and persist the resulting status together with the application URI
    pub async fn transition_with_uri(
        &mut self,
        event: AssemblyEvent,
        application_uri: impl Into<String>,
    ) -> StateMachineResult<AssemblyState> {
        self.apply(event, Some(application_uri.into())).await
    }

    async fn apply(
        &mut self,
        event: AssemblyEvent,
        application_uri: Option<String>,
    ) -> StateMachineResult<AssemblyState> {
        let target = match determine_target_state(self.current, &event) {
            Ok(target) => target,
            Err(err) => {
                warn!(
                    assembly_id = self.assembly_id,
                    from = %self.current,
                    event = event.event_type(),
                    "⚠️ Rejected assembly transition"
                );
                return Err(err);
            }
        };

        debug!(
            assembly_id = self.assembly_id,
            from = %self.current,
            to = %target,
            event = event.event_type(),
            reason = event.error_message(),
            "Assembly transition"
        );
        self.current = target;

        if !target.is_persisted() {
            return Ok(target);
        }

        let mut update = AssemblyUpdate::status(target);
        if let Some(uri) = application_uri {
            update = update.with_application_uri(uri);
        }

        if let Err(err) = self
            .repository
            .update_and_save(self.assembly_id, &update)
            .await
        {
            error!(
                assembly_id = self.assembly_id,
                status = %target,
                error = %err,
                "❌ Failed to persist assembly status"
            );
        }

        Ok(target)
    }
}

impl std::fmt::Debug for AssemblyStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyStateMachine")
            .field("assembly_id", &self.assembly_id)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Assembly;
    use crate::persistence::{InMemoryDeployerStore, PersistenceError, PersistenceResult};
    use crate::state_machine::StateMachineError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn machine(status: AssemblyState) -> (Arc<InMemoryDeployerStore>, AssemblyStateMachine) {
        let store = Arc::new(InMemoryDeployerStore::new());
        let plan = store.create_plan("shop");
        let assembly = store.create_assembly(plan.id, "shop", status, None, Utc::now());
        let sm = AssemblyStateMachine::new(assembly.id, status, store.clone());
        (store, sm)
    }

    #[tokio::test]
    async fn test_creating_stack_is_not_written() {
        let (store, mut sm) = machine(AssemblyState::Built);

        let state = sm.transition(AssemblyEvent::BeginDeploy).await.unwrap();

        assert_eq!(state, AssemblyState::CreatingStack);
        assert_eq!(
            store.assembly(sm.assembly_id()).unwrap().status,
            AssemblyState::Built
        );
    }

    #[tokio::test]
    async fn test_provisioned_writes_status_and_uri_together() {
        let (store, mut sm) = machine(AssemblyState::Built);
        sm.transition(AssemblyEvent::BeginDeploy).await.unwrap();
        sm.transition(AssemblyEvent::StackSubmitted).await.unwrap();

        sm.transition_with_uri(AssemblyEvent::StackProvisioned, "http://10.0.0.5:8080")
            .await
            .unwrap();

        let stored = store.assembly(sm.assembly_id()).unwrap();
        assert_eq!(stored.status, AssemblyState::StartingApp);
        assert_eq!(stored.application_uri.as_deref(), Some("http://10.0.0.5:8080"));
    }

    #[tokio::test]
    async fn test_rejected_event_writes_nothing() {
        let (store, mut sm) = machine(AssemblyState::Ready);

        let result = sm.transition(AssemblyEvent::AppUnreachable).await;

        assert!(matches!(
            result,
            Err(StateMachineError::InvalidTransition { .. })
        ));
        assert_eq!(sm.current_state(), AssemblyState::Ready);
        assert_eq!(
            store.assembly(sm.assembly_id()).unwrap().status,
            AssemblyState::Ready
        );
    }

    struct FailingRepository;

    #[async_trait]
    impl AssemblyRepository for FailingRepository {
        async fn get_by_id(&self, id: i64) -> PersistenceResult<Assembly> {
            Err(PersistenceError::not_found("assembly", id))
        }
        async fn get_by_uuid(&self, _uuid: Uuid) -> PersistenceResult<Assembly> {
            Err(PersistenceError::integrity_violation("unavailable"))
        }
        async fn update_and_save(
            &self,
            _id: i64,
            _update: &AssemblyUpdate,
        ) -> PersistenceResult<Assembly> {
            Err(PersistenceError::integrity_violation("unavailable"))
        }
        async fn destroy(&self, _id: i64) -> PersistenceResult<()> {
            Ok(())
        }
        async fn list_by_plan(&self, _plan_id: i64) -> PersistenceResult<Vec<Assembly>> {
            Ok(Vec::new())
        }
        async fn get_earlier(
            &self,
            _plan_id: i64,
            _status: AssemblyState,
            _created_before: DateTime<Utc>,
        ) -> PersistenceResult<Vec<Assembly>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_write_failure_does_not_abort() {
        let mut sm =
            AssemblyStateMachine::new(1, AssemblyState::Built, Arc::new(FailingRepository));
        sm.transition(AssemblyEvent::BeginDeploy).await.unwrap();

        let state = sm.transition(AssemblyEvent::StackSubmitted).await.unwrap();

        assert_eq!(state, AssemblyState::Deploying);
        assert_eq!(sm.current_state(), AssemblyState::Deploying);
    }
}
