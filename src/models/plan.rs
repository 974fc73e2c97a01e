use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application whose deployed instances are assemblies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
}
