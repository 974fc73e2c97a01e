use super::bootstrap::{publish_ports_arg, registry_bootstrap_script, rewrite_bootstrap_script};
use super::catalog::{CatalogError, TemplateCatalog};
use crate::config::DeployerSettings;
use crate::constants::catalog::{CONTAINER_TEMPLATE, TEMPLATES_CATEGORY, VM_TEMPLATE};
use crate::models::{Assembly, DeploymentRequest};
use crate::stack::StackParameters;
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors for format/storage combinations the deployer cannot provision
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("Image format {0} is not supported")]
    UnsupportedFormat(String),

    #[error("Image storage {0} is not supported")]
    UnsupportedStorage(String),

    #[error("image_storage {storage} not supported with image_format {format}")]
    UnsupportedCombination { format: String, storage: String },

    #[error("Template {category}/{name} not found")]
    TemplateNotFound { category: String, name: String },

    #[error("Template transform failed: {0}")]
    TemplateTransform(String),
}

impl From<CatalogError> for SelectionError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { category, name } => {
                SelectionError::TemplateNotFound { category, name }
            }
            other => SelectionError::TemplateTransform(other.to_string()),
        }
    }
}

/// Runtime packaging format of the built artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Docker,
    Vm,
}

impl FromStr for ImageFormat {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "docker" => Ok(Self::Docker),
            "vm" => Ok(Self::Vm),
            other => Err(SelectionError::UnsupportedFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Docker => "docker",
            Self::Vm => "vm",
        })
    }
}

/// Backend the artifact is fetched from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageStorage {
    Glance,
    DockerRegistry,
    Swift,
}

impl FromStr for ImageStorage {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "glance" => Ok(Self::Glance),
            "docker_registry" => Ok(Self::DockerRegistry),
            "swift" => Ok(Self::Swift),
            other => Err(SelectionError::UnsupportedStorage(other.to_string())),
        }
    }
}

impl fmt::Display for ImageStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Glance => "glance",
            Self::DockerRegistry => "docker_registry",
            Self::Swift => "swift",
        })
    }
}

/// Supported (format, storage) pairs, each with its own template and parameter shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentTarget {
    /// Container image, any storage backend
    ContainerImage,
    /// VM image whose deployment unit is fetched from the object store
    VmImage,
    /// VM image that pulls the deployment unit from a registry at boot
    VmImageFromRegistry,
}

impl DeploymentTarget {
    pub fn resolve(format: ImageFormat, storage: ImageStorage) -> Result<Self, SelectionError> {
        match (format, storage) {
            (ImageFormat::Docker, _) => Ok(Self::ContainerImage),
            (ImageFormat::Vm, ImageStorage::Swift) => Ok(Self::VmImage),
            (ImageFormat::Vm, ImageStorage::DockerRegistry) => Ok(Self::VmImageFromRegistry),
            (ImageFormat::Vm, ImageStorage::Glance) => Err(SelectionError::UnsupportedCombination {
                format: format.to_string(),
                storage: storage.to_string(),
            }),
        }
    }

    /// Resolve from configuration tags
    pub fn from_tags(format: &str, storage: &str) -> Result<Self, SelectionError> {
        Self::resolve(format.parse()?, storage.parse()?)
    }

    pub fn template_name(&self) -> &'static str {
        match self {
            Self::ContainerImage => CONTAINER_TEMPLATE,
            Self::VmImage | Self::VmImageFromRegistry => VM_TEMPLATE,
        }
    }

    /// Whether the backend's network parameters are merged into the parameter set
    pub fn uses_network_parameters(&self) -> bool {
        matches!(self, Self::ContainerImage)
    }
}

/// Load the template document for a target, rewriting the bootstrap script when the
/// deployment unit comes from a registry
pub fn select_template(
    target: DeploymentTarget,
    catalog: &dyn TemplateCatalog,
    request: &DeploymentRequest,
) -> Result<String, SelectionError> {
    let template = catalog.get(TEMPLATES_CATEGORY, target.template_name())?;

    match target {
        DeploymentTarget::VmImageFromRegistry => {
            let script = registry_bootstrap_script(&request.image_location, request.ports());
            rewrite_bootstrap_script(&template, &script)
        }
        _ => Ok(template),
    }
}

/// Build the stack parameters for a target.
///
/// Container deployments expose a single port: only the first requested port is passed.
pub fn select_parameters(
    target: DeploymentTarget,
    assembly: &Assembly,
    request: &DeploymentRequest,
    settings: &DeployerSettings,
) -> StackParameters {
    let mut parameters = StackParameters::new();

    match target {
        DeploymentTarget::ContainerImage => {
            parameters.insert("app_name".to_string(), json!(assembly.name));
            parameters.insert("image".to_string(), json!(request.image_location));
            parameters.insert("port".to_string(), json!(request.primary_port()));
        }
        DeploymentTarget::VmImage | DeploymentTarget::VmImageFromRegistry => {
            parameters.insert("name".to_string(), json!(assembly.uuid.to_string()));
            parameters.insert("flavor".to_string(), json!(settings.flavor));
            parameters.insert("image".to_string(), json!(settings.image));
            parameters.insert("location".to_string(), json!(request.image_location));
            parameters.insert("du".to_string(), json!(request.image_name));
            parameters.insert(
                "publish_ports".to_string(),
                json!(publish_ports_arg(request.ports())),
            );
        }
    }

    parameters
}
