//! Per-library package descriptor (`package.json`).

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};

pub const DESCRIPTOR_FILE: &str = "package.json";

/// The parts of a library's `package.json` this tool reads. Never written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDescriptor {
    pub name: Option<String>,
    pub version: Option<String>,
    #[serde(default)]
    pub peer_dependencies: IndexMap<String, String>,
}

impl PackageDescriptor {
    /// Reads `package.json` from a library directory.
    pub fn read(library_dir: &Path) -> Result<Self> {
        let path = library_dir.join(DESCRIPTOR_FILE);
        if !path.is_file() {
            return Err(Error::MissingPath(path));
        }
        let content = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse { path, source })
    }

    pub fn peer_dependency_names(&self) -> impl Iterator<Item = &str> {
        self.peer_dependencies.keys().map(String::as_str)
    }
}
