//! Library project discovery.

use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::error::{Error, Result};

/// Lists the direct sub-directories of `root`, minus `exclude`.
///
/// Order follows the filesystem listing. A missing `root` is not an error and
/// yields an empty list.
pub fn list_projects(root: &Path, exclude: &[String]) -> Result<Vec<String>> {
    if !root.is_dir() {
        debug!(root = %root.display(), "project root does not exist");
        return Ok(Vec::new());
    }

    let mut projects = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| Error::io(root, e.into()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if exclude.iter().any(|x| x == &name) {
            continue;
        }
        projects.push(name);
    }

    Ok(projects)
}

/// Library directory names found under a root at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSet {
    names: Vec<String>,
}

impl ProjectSet {
    /// Lists the libraries of the workspace.
    pub fn discover(config: &WorkspaceConfig) -> Result<Self> {
        let root = config.libraries_root();
        info!("Looking in {} for projects", root.display());
        let names = list_projects(&root, &config.excluded_projects)?;
        Ok(Self { names })
    }

    /// Lists the libraries that already have build output.
    pub fn discover_built(config: &WorkspaceConfig) -> Result<Self> {
        let names = list_projects(&config.scoped_dist_root(), &[])?;
        Ok(Self { names })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

impl From<Vec<String>> for ProjectSet {
    fn from(names: Vec<String>) -> Self {
        Self { names }
    }
}

impl<'a> FromIterator<&'a str> for ProjectSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(str::to_string).collect(),
        }
    }
}
