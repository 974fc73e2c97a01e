//! In-memory repositories.
//!
//! Backs the test suites and single-process embeddings. Every call takes the lock once,
//! so each update is visible to all workflows as soon as the call returns.

use super::{
    AssemblyRepository, ComponentRepository, ImageRepository, PersistenceError,
    PersistenceResult, PlanRepository,
};
use crate::models::{Assembly, AssemblyUpdate, Image, NewStackComponent, Plan, StackComponent};
use crate::state_machine::AssemblyState;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    next_id: i64,
    assemblies: HashMap<i64, Assembly>,
    components: HashMap<i64, StackComponent>,
    images: HashMap<i64, Image>,
    plans: HashMap<i64, Plan>,
}

impl StoreState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Thread-safe store implementing every repository trait
#[derive(Debug, Default)]
pub struct InMemoryDeployerStore {
    state: Mutex<StoreState>,
}

impl InMemoryDeployerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_plan(&self, name: impl Into<String>) -> Plan {
        let mut state = self.state.lock();
        let plan = Plan {
            id: state.allocate_id(),
            uuid: Uuid::new_v4(),
            name: name.into(),
        };
        state.plans.insert(plan.id, plan.clone());
        plan
    }

    pub fn create_image(&self, name: impl Into<String>, docker_image_name: Option<String>) -> Image {
        let mut state = self.state.lock();
        let image = Image {
            id: state.allocate_id(),
            uuid: Uuid::new_v4(),
            name: name.into(),
            docker_image_name,
            created_at: Utc::now(),
        };
        state.images.insert(image.id, image.clone());
        image
    }

    pub fn create_assembly(
        &self,
        plan_id: i64,
        name: impl Into<String>,
        status: AssemblyState,
        image_id: Option<i64>,
        created_at: DateTime<Utc>,
    ) -> Assembly {
        let mut state = self.state.lock();
        let assembly = Assembly {
            id: state.allocate_id(),
            uuid: Uuid::new_v4(),
            plan_id,
            name: name.into(),
            status,
            application_uri: None,
            image_id,
            created_at,
            updated_at: created_at,
        };
        state.assemblies.insert(assembly.id, assembly.clone());
        assembly
    }

    /// Overwrite an assembly's status outside of any workflow (API-layer writes)
    pub fn set_status(&self, id: i64, status: AssemblyState) {
        if let Some(assembly) = self.state.lock().assemblies.get_mut(&id) {
            assembly.status = status;
        }
    }

    pub fn assembly(&self, id: i64) -> Option<Assembly> {
        self.state.lock().assemblies.get(&id).cloned()
    }

    pub fn image(&self, id: i64) -> Option<Image> {
        self.state.lock().images.get(&id).cloned()
    }

    pub fn plan(&self, id: i64) -> Option<Plan> {
        self.state.lock().plans.get(&id).cloned()
    }

    pub fn stack_component(&self, assembly_id: i64) -> Option<StackComponent> {
        self.state
            .lock()
            .components
            .values()
            .find(|c| c.assembly_id == assembly_id)
            .cloned()
    }

    pub fn assembly_count(&self) -> usize {
        self.state.lock().assemblies.len()
    }
}

#[async_trait]
impl AssemblyRepository for InMemoryDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Assembly> {
        self.assembly(id)
            .ok_or_else(|| PersistenceError::not_found("assembly", id))
    }

    async fn get_by_uuid(&self, uuid: Uuid) -> PersistenceResult<Assembly> {
        self.state
            .lock()
            .assemblies
            .values()
            .find(|a| a.uuid == uuid)
            .cloned()
            .ok_or_else(|| PersistenceError::InvalidRecord {
                reason: format!("no assembly with uuid {uuid}"),
            })
    }

    async fn update_and_save(
        &self,
        id: i64,
        update: &AssemblyUpdate,
    ) -> PersistenceResult<Assembly> {
        let mut state = self.state.lock();
        let assembly = state
            .assemblies
            .get_mut(&id)
            .ok_or_else(|| PersistenceError::not_found("assembly", id))?;
        update.apply_to(assembly);
        Ok(assembly.clone())
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        let mut state = self.state.lock();
        if state.assemblies.remove(&id).is_none() {
            return Err(PersistenceError::not_found("assembly", id));
        }
        state.components.retain(|_, c| c.assembly_id != id);
        Ok(())
    }

    async fn list_by_plan(&self, plan_id: i64) -> PersistenceResult<Vec<Assembly>> {
        let mut assemblies: Vec<Assembly> = self
            .state
            .lock()
            .assemblies
            .values()
            .filter(|a| a.plan_id == plan_id)
            .cloned()
            .collect();
        assemblies.sort_by_key(|a| (a.created_at, a.id));
        Ok(assemblies)
    }

    async fn get_earlier(
        &self,
        plan_id: i64,
        status: AssemblyState,
        created_before: DateTime<Utc>,
    ) -> PersistenceResult<Vec<Assembly>> {
        let mut assemblies: Vec<Assembly> = self
            .state
            .lock()
            .assemblies
            .values()
            .filter(|a| a.plan_id == plan_id && a.status == status && a.created_at < created_before)
            .cloned()
            .collect();
        assemblies.sort_by_key(|a| (a.created_at, a.id));
        Ok(assemblies)
    }
}

#[async_trait]
impl ComponentRepository for InMemoryDeployerStore {
    async fn find_stack_component(
        &self,
        assembly_id: i64,
    ) -> PersistenceResult<Option<StackComponent>> {
        Ok(self.stack_component(assembly_id))
    }

    async fn create_stack_component(
        &self,
        component: NewStackComponent,
    ) -> PersistenceResult<StackComponent> {
        let mut state = self.state.lock();

        if !state.assemblies.contains_key(&component.assembly_id) {
            return Err(PersistenceError::integrity_violation(format!(
                "assembly {} does not exist",
                component.assembly_id
            )));
        }
        if state
            .components
            .values()
            .any(|c| c.assembly_id == component.assembly_id)
        {
            return Err(PersistenceError::integrity_violation(format!(
                "assembly {} already has a stack component",
                component.assembly_id
            )));
        }

        let record = StackComponent {
            id: state.allocate_id(),
            assembly_id: component.assembly_id,
            name: component.name,
            component_type: component.component_type,
            description: component.description,
            resource_uri: component.resource_uri,
            stack_id: component.stack_id,
            created_at: Utc::now(),
        };
        state.components.insert(record.id, record.clone());
        Ok(record)
    }
}

#[async_trait]
impl ImageRepository for InMemoryDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Image> {
        self.image(id)
            .ok_or_else(|| PersistenceError::not_found("image", id))
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        self.state
            .lock()
            .images
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("image", id))
    }
}

#[async_trait]
impl PlanRepository for InMemoryDeployerStore {
    async fn get_by_id(&self, id: i64) -> PersistenceResult<Plan> {
        self.plan(id)
            .ok_or_else(|| PersistenceError::not_found("plan", id))
    }

    async fn destroy(&self, id: i64) -> PersistenceResult<()> {
        self.state
            .lock()
            .plans
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PersistenceError::not_found("plan", id))
    }
}
