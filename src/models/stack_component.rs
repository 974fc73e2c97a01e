use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Association between an assembly and the remote stack it provisioned.
/// At most one exists per assembly; its presence selects update over create on redeploy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackComponent {
    pub id: i64,
    pub assembly_id: i64,
    pub name: String,
    pub component_type: String,
    pub description: String,
    /// Resource link returned by the stack backend
    pub resource_uri: String,
    pub stack_id: String,
    pub created_at: DateTime<Utc>,
}

/// New StackComponent for creation (without generated fields)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewStackComponent {
    pub assembly_id: i64,
    pub name: String,
    pub component_type: String,
    pub description: String,
    pub resource_uri: String,
    pub stack_id: String,
}
