use crate::constants::naming::STACK_NAME_PREFIX_LEN;
use crate::state_machine::AssemblyState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assembly is one deployed instance of an application (plan)
/// Maps to the `assemblies` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub id: i64,
    pub uuid: Uuid,
    /// Owning application
    pub plan_id: i64,
    pub name: String,
    pub status: AssemblyState,
    /// Null until the stack publishes an endpoint
    pub application_uri: Option<String>,
    /// Built deployment unit, if the build pipeline produced one
    pub image_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Assembly {
    /// Remote stack name: the first 100 characters of the assembly name, a dash and the uuid
    pub fn stack_name(&self) -> String {
        let prefix: String = self.name.chars().take(STACK_NAME_PREFIX_LEN).collect();
        format!("{}-{}", prefix, self.uuid)
    }

    /// Resource id under which the assembly's user logs are stored
    pub fn logs_resource_id(&self) -> String {
        self.uuid.to_string()
    }

    pub fn is_deleting(&self) -> bool {
        self.status == AssemblyState::Deleting
    }
}

/// Partial update applied to an assembly record by the status writer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyUpdate {
    pub status: Option<AssemblyState>,
    pub application_uri: Option<String>,
}

impl AssemblyUpdate {
    pub fn status(status: AssemblyState) -> Self {
        Self {
            status: Some(status),
            application_uri: None,
        }
    }

    pub fn with_application_uri(mut self, uri: impl Into<String>) -> Self {
        self.application_uri = Some(uri.into());
        self
    }

    /// Apply this update onto a record in place
    pub fn apply_to(&self, assembly: &mut Assembly) {
        if let Some(status) = self.status {
            assembly.status = status;
        }
        if let Some(uri) = &self.application_uri {
            assembly.application_uri = Some(uri.clone());
        }
        assembly.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembly(name: &str) -> Assembly {
        Assembly {
            id: 1,
            uuid: Uuid::new_v4(),
            plan_id: 10,
            name: name.to_string(),
            status: AssemblyState::Built,
            application_uri: None,
            image_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_stack_name_truncates_long_names() {
        let long_name = "a".repeat(300);
        let assem = assembly(&long_name);
        let stack_name = assem.stack_name();

        assert_eq!(stack_name.len(), 100 + 1 + 36);
        assert!(stack_name.ends_with(&assem.uuid.to_string()));
        assert!(stack_name.starts_with(&"a".repeat(100)));
    }

    #[test]
    fn test_stack_name_keeps_short_names() {
        let assem = assembly("shop");
        assert_eq!(assem.stack_name(), format!("shop-{}", assem.uuid));
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut assem = assembly("shop");
        assem.application_uri = Some("http://old".to_string());

        AssemblyUpdate::status(AssemblyState::Deploying).apply_to(&mut assem);
        assert_eq!(assem.status, AssemblyState::Deploying);
        assert_eq!(assem.application_uri.as_deref(), Some("http://old"));

        AssemblyUpdate::status(AssemblyState::StartingApp)
            .with_application_uri("http://10.0.0.5:8080")
            .apply_to(&mut assem);
        assert_eq!(assem.application_uri.as_deref(), Some("http://10.0.0.5:8080"));
    }
}
