use crate::error::{DeployerError, DeployerResult};
use serde::Serialize;

/// Transient input for one deploy workflow run; never persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRequest {
    pub assembly_id: i64,
    /// Where the built artifact lives (image reference or object-store location)
    pub image_location: String,
    /// Name of the built artifact
    pub image_name: String,
    ports: Vec<u16>,
}

impl DeploymentRequest {
    /// Build a request; the port sequence must be non-empty
    pub fn new(
        assembly_id: i64,
        image_location: impl Into<String>,
        image_name: impl Into<String>,
        ports: Vec<u16>,
    ) -> DeployerResult<Self> {
        if ports.is_empty() {
            return Err(DeployerError::SelectionError(format!(
                "deployment request for assembly {assembly_id} names no ports"
            )));
        }

        Ok(Self {
            assembly_id,
            image_location: image_location.into(),
            image_name: image_name.into(),
            ports,
        })
    }

    /// Requested ports in order; never empty
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn primary_port(&self) -> u16 {
        self.ports[0]
    }
}
