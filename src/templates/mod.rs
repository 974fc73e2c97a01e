//! # Template Selection
//!
//! Maps the configured runtime packaging format and storage backend onto a stack
//! template and its parameter set. The only I/O is reading documents from a
//! [`TemplateCatalog`].

pub mod bootstrap;
pub mod catalog;
pub mod selector;

pub use catalog::{CatalogError, FsTemplateCatalog, TemplateCatalog};
pub use selector::{
    select_parameters, select_template, DeploymentTarget, ImageFormat, ImageStorage,
    SelectionError,
};
