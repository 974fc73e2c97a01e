//! # Deployer Constants
//!
//! Default tunables, catalog keys and remote status strings that define the
//! operational boundaries of the deployment engine. Configuration defaults in
//! [`crate::config`] are built from these values.

/// Defaults for the deployer configuration section
pub mod defaults {
    /// Attempts to query a stack for its provisioning status
    pub const MAX_ATTEMPTS: u32 = 600;
    /// Attempts to reach the deployed application on its ports
    pub const DU_ATTEMPTS: u32 = 500;
    /// Initial sleep between two stack status queries, in seconds
    pub const WAIT_INTERVAL_SECONDS: f64 = 1.0;
    /// Factor by which the stack poll interval grows after every attempt
    pub const GROWTH_FACTOR: f64 = 1.1;
    /// Fixed sleep between readiness probe attempts
    pub const PROBE_INTERVAL_MS: u64 = 1000;
    /// Per-port connect timeout used by the readiness probe
    pub const PROBE_TIMEOUT_MS: u64 = 5000;
    pub const FLAVOR: &str = "m1.small";
    pub const IMAGE: &str = "coreos";
    pub const DEPLOYER_LOG_DIR: &str = "/var/log/deployer";
    pub const IMAGE_FORMAT: &str = "docker";
    pub const IMAGE_STORAGE: &str = "glance";
    pub const DU_CONTAINER: &str = "deployment_units";
    pub const DATABASE_URL: &str = "postgresql://localhost/deployer_development";
    pub const DATABASE_MAX_CONNECTIONS: u32 = 10;
}

/// Template catalog keys
pub mod catalog {
    pub const TEMPLATES_CATEGORY: &str = "templates";
    pub const CONTAINER_TEMPLATE: &str = "basic";
    pub const VM_TEMPLATE: &str = "coreos";
    pub const CONTRIB_CATEGORY: &str = "contrib";
    /// Helper script shipped alongside every newly created stack
    pub const DU_HANDLING_SCRIPT: &str = "robust-du-handling.sh";
}

/// Status strings reported by the orchestration-stack backend
pub mod stack_status {
    pub const COMPLETE: &str = "COMPLETE";
    pub const FAILED: &str = "FAILED";
    pub const IN_PROGRESS: &str = "IN_PROGRESS";
}

/// Naming rules for remote stacks and local component records
pub mod naming {
    /// Characters of the assembly name kept in the stack name (remote limit is 255)
    pub const STACK_NAME_PREFIX_LEN: usize = 100;
    pub const COMPONENT_TYPE: &str = "orchestration_stack";
    pub const COMPONENT_NAME_PREFIX: &str = "stack_for_";
}

/// Readiness probe warns on the first failed attempt, then once every this many attempts
pub const PROBE_WARN_EVERY: u32 = 5;
