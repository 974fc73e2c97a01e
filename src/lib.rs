#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Deployer Core Rust
//!
//! Deployment orchestration engine for application assemblies.
//!
//! ## Overview
//!
//! An *assembly* is one deployed instance of an application (a *plan*). The deployer
//! turns a built artifact into a running assembly by driving a remote orchestration-stack
//! API, waiting for the stack to provision, and probing the application's ports until it
//! answers. When a new assembly reaches READY, older READY assemblies of the same plan are
//! destroyed (blue-green cleanup).
//!
//! ## Module Organization
//!
//! - [`orchestration`] - Deploy and teardown workflows, dependency context
//! - [`stack`] - Stack API adapter trait and the status poller
//! - [`readiness`] - Port reachability checks and the readiness prober
//! - [`templates`] - Template catalog and format/storage selection
//! - [`state_machine`] - Assembly status enum, transition table and status writer
//! - [`persistence`] - Repository traits with in-memory and PostgreSQL stores
//! - [`artifacts`] - Object store and log store collaborators, artifact cleanup
//! - [`config`] - Configuration loading and validation
//! - [`logging`] - Structured logging setup
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deployer_core::artifacts::{InMemoryLogStore, InMemoryObjectStore};
//! use deployer_core::config::ConfigManager;
//! use deployer_core::models::DeploymentRequest;
//! use deployer_core::orchestration::{DeployerContext, DeploymentOrchestrator};
//! use deployer_core::stack::StackClient;
//! use deployer_core::templates::FsTemplateCatalog;
//!
//! # async fn example(stack_client: Arc<dyn StackClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let context = DeployerContext::from_config_manager(
//!     manager,
//!     stack_client,
//!     Arc::new(FsTemplateCatalog::new("catalog")),
//!     Arc::new(InMemoryObjectStore::new()),
//!     Arc::new(InMemoryLogStore::new()),
//! )
//! .await?;
//!
//! let orchestrator = DeploymentOrchestrator::new(Arc::new(context));
//! let request = DeploymentRequest::new(42, "registry/shop:1", "shop-du", vec![8080])?;
//! let outcome = orchestrator.deploy(request).await?;
//! println!("deploy finished: {outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod persistence;
pub mod readiness;
pub mod stack;
pub mod state_machine;
pub mod templates;
pub mod test_helpers;

pub use config::{ConfigManager, DeployerConfig};
pub use error::{DeployerError, DeployerResult};
pub use models::{Assembly, DeploymentRequest};
pub use orchestration::{
    DeployerContext, DeploymentOrchestrator, DeploymentOutcome, DestroyOutcome,
};
pub use state_machine::{AssemblyEvent, AssemblyState};
