//! Domain records consumed and mutated by the deployer.
//!
//! Creation of assemblies, images and plans belongs to the API layer; the deployer only
//! reads them, writes assembly status, records stack components and destroys records.

pub mod assembly;
pub mod deployment_request;
pub mod image;
pub mod plan;
pub mod stack_component;

pub use assembly::{Assembly, AssemblyUpdate};
pub use deployment_request::DeploymentRequest;
pub use image::Image;
pub use plan::Plan;
pub use stack_component::{NewStackComponent, StackComponent};
