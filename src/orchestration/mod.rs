//! # Deployment Orchestration
//!
//! [`DeploymentOrchestrator`] sequences a deploy: template selection, stack create or
//! update, status polling, readiness probing and the status transitions that go with
//! them. A deploy that reaches READY destroys the plan's older READY assemblies
//! (blue-green cleanup). The same orchestrator owns teardown: stack delete, absence
//! polling, record destruction and artifact cleanup.
//!
//! Status writes go straight to the repository and are awaited before the workflow
//! continues, so a teardown racing a deploy is seen at the deploy's next checkpoint.

pub mod context;
pub mod deployer;
pub mod endpoint;
pub mod teardown;

pub use context::DeployerContext;
pub use deployer::{DeploymentOrchestrator, DeploymentOutcome};
pub use endpoint::{application_uri, endpoint_host};
pub use teardown::{AppTeardown, DestroyOutcome};
