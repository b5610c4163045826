//! Keeps the workspace manifest and the path-map document in line with the
//! libraries present on disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::WorkspaceConfig;
use crate::discovery::ProjectSet;
use crate::error::{Error, Result};
use crate::naming::LibraryNaming;

/// The two generated documents and where their library collection lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// `angular.json`: `projects` maps a project name to its settings object.
    Manifest,
    /// `tsconfig.json`: `compilerOptions.paths` maps a name to a list of paths.
    PathMap,
}

impl DocumentKind {
    fn collection_pointer(&self) -> &'static str {
        match self {
            DocumentKind::Manifest => "/projects",
            DocumentKind::PathMap => "/compilerOptions/paths",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Manifest => "manifest",
            DocumentKind::PathMap => "path map",
        }
    }

    fn validate_entry(&self, value: &Value) -> bool {
        match self {
            DocumentKind::Manifest => value.is_object(),
            DocumentKind::PathMap => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

/// Per-document correction applied to every entry that survives
/// reconciliation.
pub trait EntryFixup {
    /// Corrects `collection[key]` in place, describing the change if one was made.
    fn fix_entry(&mut self, collection: &mut Map<String, Value>, key: &str) -> Option<String>;

    /// Settings for a discovered library that has no entry yet.
    fn missing_entry(&self, _library: &str) -> Option<Value> {
        None
    }
}

/// What one synchronization pass changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub showcase: Option<String>,
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub fixes: Vec<String>,
    /// Library keys left in the collection, showcase excluded.
    pub libraries: Vec<String>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        !self.removed.is_empty() || !self.added.is_empty() || !self.fixes.is_empty()
    }
}

/// A parsed document with a validated library collection.
struct Document {
    path: PathBuf,
    kind: DocumentKind,
    root: Value,
}

impl Document {
    fn load(path: &Path, kind: DocumentKind) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::MissingPath(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let root: Value = serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        let collection = root
            .pointer(kind.collection_pointer())
            .ok_or_else(|| Error::InvalidDocument {
                path: path.to_path_buf(),
                message: format!("missing '{}'", kind.collection_pointer()),
            })?
            .as_object()
            .ok_or_else(|| Error::InvalidDocument {
                path: path.to_path_buf(),
                message: format!("'{}' is not an object", kind.collection_pointer()),
            })?;

        if let Some((key, _)) = collection.iter().find(|(_, v)| !kind.validate_entry(v)) {
            return Err(Error::InvalidDocument {
                path: path.to_path_buf(),
                message: format!(
                    "entry '{}' does not have the expected {} shape",
                    key,
                    kind.as_str()
                ),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            kind,
            root,
        })
    }

    fn collection_mut(&mut self) -> Result<&mut Map<String, Value>> {
        let pointer = self.kind.collection_pointer();
        self.root
            .pointer_mut(pointer)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| Error::InvalidDocument {
                path: self.path.clone(),
                message: format!("'{}' is not an object", pointer),
            })
    }

    fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.root).map_err(|source| Error::ConfigParse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|e| Error::io(&self.path, e))
    }
}

/// Reconciles one document against `projects`.
///
/// Every key other than the showcase whose library is not in `projects` is
/// deleted; every other key goes through `fixup`. The document is rewritten
/// whether or not anything changed.
pub fn synchronize(
    path: &Path,
    kind: DocumentKind,
    projects: &ProjectSet,
    naming: &LibraryNaming,
    showcase: Option<&str>,
    fixup: &mut dyn EntryFixup,
) -> Result<SyncReport> {
    let mut document = Document::load(path, kind)?;
    let display_path = path.display().to_string();
    let collection = document.collection_mut()?;

    let showcase = match showcase {
        Some(name) => Some(name.to_string()),
        None if kind == DocumentKind::Manifest => detect_showcase(collection, &display_path),
        None => None,
    };

    let mut report = SyncReport {
        path: path.to_path_buf(),
        kind,
        showcase: showcase.clone(),
        removed: Vec::new(),
        added: Vec::new(),
        fixes: Vec::new(),
        libraries: Vec::new(),
    };

    let keys: Vec<String> = collection
        .keys()
        .filter(|key| Some(key.as_str()) != showcase.as_deref())
        .cloned()
        .collect();

    for key in keys {
        let library = naming.from_scoped_registry_name(&key);
        if !projects.contains(&library) {
            warn!(
                "{} was found in {} but not among the library projects - deleting from {}",
                library, display_path, display_path
            );
            collection.shift_remove(&key);
            report.removed.push(key);
            continue;
        }
        if let Some(fix) = fixup.fix_entry(collection, &key) {
            warn!("{}", fix);
            report.fixes.push(fix);
        }
    }

    for library in projects.iter() {
        let key = naming.to_registry_name(library);
        if collection.contains_key(&key) {
            continue;
        }
        if let Some(entry) = fixup.missing_entry(library) {
            warn!("No entry for {} found in {}; adding.", key, display_path);
            collection.insert(key.clone(), entry);
            report.added.push(key);
        }
    }

    report.libraries = collection
        .keys()
        .filter(|key| Some(key.as_str()) != showcase.as_deref())
        .cloned()
        .collect();

    document.save()?;
    info!(
        "{} contains the following library projects: {}",
        display_path,
        report.libraries.join(", ")
    );

    Ok(report)
}

/// Picks the first application-type project as the showcase.
fn detect_showcase(collection: &Map<String, Value>, display_path: &str) -> Option<String> {
    let showcase = collection
        .iter()
        .find(|(_, entry)| {
            entry.get("projectType").and_then(Value::as_str) == Some("application")
        })
        .map(|(name, _)| name.clone());

    match &showcase {
        Some(name) => warn!(
            "No showcaseProjectName set in options, setting to {}",
            name
        ),
        None => warn!(
            "No showcaseProjectName found in options or {}.",
            display_path
        ),
    }
    showcase
}

/// Points every library's test target at the shared test-runner config.
pub struct ManifestFixup {
    test_runner_config: Option<String>,
}

impl ManifestFixup {
    pub fn new(test_runner_config: Option<String>) -> Self {
        Self { test_runner_config }
    }
}

impl EntryFixup for ManifestFixup {
    fn fix_entry(&mut self, collection: &mut Map<String, Value>, key: &str) -> Option<String> {
        let canonical = self.test_runner_config.as_ref()?;
        let test_target = collection
            .get_mut(key)?
            .pointer_mut("/architect/test")?
            .as_object_mut()?;
        let options = test_target
            .entry("options")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()?;

        let current = options.get("karmaConfig").and_then(Value::as_str);
        if current == Some(canonical.as_str()) {
            return None;
        }
        let message = format!(
            "{} karmaConfig path: {}. Setting to {}.",
            key,
            current.unwrap_or("(none)"),
            canonical
        );
        options.insert("karmaConfig".to_string(), Value::String(canonical.clone()));
        Some(message)
    }
}

/// Keeps each library's local-source mapping last in its path list, so the
/// built output wins while sources stay reachable for source maps.
pub struct PathMapFixup<'a> {
    config: &'a WorkspaceConfig,
    naming: LibraryNaming,
}

impl<'a> PathMapFixup<'a> {
    pub fn new(config: &'a WorkspaceConfig) -> Self {
        Self {
            config,
            naming: config.naming(),
        }
    }
}

impl EntryFixup for PathMapFixup<'_> {
    fn fix_entry(&mut self, collection: &mut Map<String, Value>, key: &str) -> Option<String> {
        let library = self.naming.from_scoped_registry_name(key);
        let canonical = self.config.local_source_mapping(&library);
        let paths = collection.get_mut(key)?.as_array_mut()?;

        let positions: Vec<usize> = paths
            .iter()
            .enumerate()
            .filter(|(_, p)| p.as_str() == Some(canonical.as_str()))
            .map(|(i, _)| i)
            .collect();

        if positions.len() == 1 && positions[0] + 1 == paths.len() {
            return None;
        }

        let message = match positions.first() {
            None => format!("No project path for {} found; adding {}.", key, canonical),
            Some(0) => format!(
                "{} was found at index 0 for {} - moving to end of list",
                canonical, key
            ),
            Some(_) => format!(
                "{} is out of place for {} - moving to end of list",
                canonical, key
            ),
        };

        paths.retain(|p| p.as_str() != Some(canonical.as_str()));
        paths.push(Value::String(canonical));
        Some(message)
    }

    fn missing_entry(&self, library: &str) -> Option<Value> {
        Some(Value::Array(vec![
            Value::String(self.config.dist_mapping(library)),
            Value::String(self.config.local_source_mapping(library)),
        ]))
    }
}

/// Synchronizes both documents. A failure in one does not stop the other.
pub fn synchronize_workspace(
    config: &WorkspaceConfig,
    projects: &ProjectSet,
) -> Vec<Result<SyncReport>> {
    let naming = config.naming();

    let manifest = synchronize(
        &config.manifest_file(),
        DocumentKind::Manifest,
        projects,
        &naming,
        config.showcase_project_name.as_deref(),
        &mut ManifestFixup::new(config.test_runner_config_path.clone()),
    );

    let showcase = match &manifest {
        Ok(report) => report.showcase.clone(),
        Err(_) => config.showcase_project_name.clone(),
    };

    let path_map = synchronize(
        &config.path_map_file(),
        DocumentKind::PathMap,
        projects,
        &naming,
        showcase.as_deref(),
        &mut PathMapFixup::new(config),
    );

    vec![manifest, path_map]
}
