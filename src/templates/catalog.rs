use crate::constants::catalog::CONTRIB_CATEGORY;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Catalog entry {category}/{name} not found")]
    NotFound { category: String, name: String },

    #[error("Failed to read catalog entry {path}: {error}")]
    Io { path: String, error: String },
}

/// Named template documents and helper files
pub trait TemplateCatalog: Send + Sync {
    fn get(&self, category: &str, name: &str) -> Result<String, CatalogError>;

    /// Raw helper file shipped alongside the templates
    fn get_from_contrib(&self, name: &str) -> Result<String, CatalogError>;
}

/// Catalog rooted at a directory: `<root>/<category>/<name>.yaml` for documents and
/// `<root>/contrib/<name>` for helper files
#[derive(Debug, Clone)]
pub struct FsTemplateCatalog {
    root: PathBuf,
}

impl FsTemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read(&self, path: PathBuf, category: &str, name: &str) -> Result<String, CatalogError> {
        debug!(path = %path.display(), "Reading catalog entry");
        std::fs::read_to_string(&path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                CatalogError::NotFound {
                    category: category.to_string(),
                    name: name.to_string(),
                }
            } else {
                CatalogError::Io {
                    path: path.display().to_string(),
                    error: err.to_string(),
                }
            }
        })
    }
}

impl TemplateCatalog for FsTemplateCatalog {
    fn get(&self, category: &str, name: &str) -> Result<String, CatalogError> {
        let path = self.root.join(category).join(format!("{name}.yaml"));
        self.read(path, category, name)
    }

    fn get_from_contrib(&self, name: &str) -> Result<String, CatalogError> {
        let path = self.root.join(CONTRIB_CATEGORY).join(name);
        self.read(path, CONTRIB_CATEGORY, name)
    }
}
