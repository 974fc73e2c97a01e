//! Test doubles and fixtures shared by unit and integration tests.
//!
//! Everything here is in-memory and deterministic; time-sensitive tests pair these with
//! tokio's paused clock.

pub mod catalog;
pub mod harness;
pub mod reachability;
pub mod stack;

pub use catalog::InMemoryTemplateCatalog;
pub use harness::{deployment_request, test_config, DeployerHarness};
pub use reachability::ScriptedReachability;
pub use stack::{created_stack, descriptor, not_found, ScriptedStackClient, StackCall};
