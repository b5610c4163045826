//! Workspace options loaded from `libs.config.json`.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::naming::LibraryNaming;
use crate::toolchain::Toolchain;

/// Default location of the options file, relative to the workspace root.
pub const DEFAULT_OPTIONS_FILE: &str = "./libs.config.json";

/// Resolved workspace settings.
///
/// Built once per invocation by [`WorkspaceConfig::resolve`] and passed by
/// reference to every component afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Directory holding one sub-directory per library.
    pub projects_path: PathBuf,
    #[serde(alias = "angularJsonPath")]
    pub manifest_path: PathBuf,
    #[serde(alias = "tsconfigPath")]
    pub path_map_path: PathBuf,
    /// Shared test-runner config every library should point at.
    #[serde(alias = "karmaConfigPath")]
    pub test_runner_config_path: Option<String>,
    /// Root application excluded from reconciliation. Derived from the
    /// manifest when unset.
    pub showcase_project_name: Option<String>,
    pub library_name_prefix: String,
    pub scope_name: Option<String>,
    pub is_public_scope: bool,
    /// File whose appearance in a library's output marks its build as done.
    pub lib_file_to_wait_on_for_build: String,
    #[serde(alias = "npmrcPath")]
    pub registry_auth_file_path: Option<PathBuf>,
    /// Build output root, parallel to `projects_path`.
    pub dist_path: PathBuf,
    /// Library entry point relative to the library directory.
    pub library_entry_file: String,
    /// Housekeeping directories under the libraries root that are not libraries.
    pub excluded_projects: Vec<String>,
    pub tools: Toolchain,
    /// Directory every relative path above is resolved against.
    #[serde(skip)]
    pub workspace_root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            projects_path: PathBuf::from("./projects"),
            manifest_path: PathBuf::from("./angular.json"),
            path_map_path: PathBuf::from("./tsconfig.json"),
            test_runner_config_path: None,
            showcase_project_name: None,
            library_name_prefix: String::new(),
            scope_name: None,
            is_public_scope: true,
            lib_file_to_wait_on_for_build: "public-api.d.ts".to_string(),
            registry_auth_file_path: None,
            dist_path: PathBuf::from("./dist"),
            library_entry_file: "src/public-api.ts".to_string(),
            excluded_projects: vec!["styles".to_string()],
            tools: Toolchain::default(),
            workspace_root: PathBuf::from("."),
        }
    }
}

impl WorkspaceConfig {
    /// Loads the options file relative to the current working directory.
    pub fn resolve(options_file: impl AsRef<Path>) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::io(".", e))?;
        Self::resolve_in(cwd, options_file)
    }

    /// Loads the options file with `workspace_root` as the base directory.
    ///
    /// A missing file yields the defaults; malformed JSON is fatal.
    pub fn resolve_in(
        workspace_root: impl Into<PathBuf>,
        options_file: impl AsRef<Path>,
    ) -> Result<Self> {
        let workspace_root = workspace_root.into();
        let options_path = resolve_path(&workspace_root, options_file.as_ref());

        let mut config = if options_path.is_file() {
            let content = std::fs::read_to_string(&options_path)
                .map_err(|e| Error::io(&options_path, e))?;
            let config: WorkspaceConfig =
                serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
                    path: options_path.clone(),
                    source,
                })?;
            debug!(path = %options_path.display(), "loaded options file");
            config
        } else {
            warn!(
                "No options file found at {}. Using default values.",
                options_path.display()
            );
            WorkspaceConfig::default()
        };

        config.workspace_root = workspace_root;
        config.normalize();
        Ok(config)
    }

    /// Empty strings in the options file mean "not set".
    fn normalize(&mut self) {
        fn blank_to_none(value: &mut Option<String>) {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *value = None;
            }
        }
        blank_to_none(&mut self.scope_name);
        blank_to_none(&mut self.showcase_project_name);
        blank_to_none(&mut self.test_runner_config_path);
        if self
            .registry_auth_file_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.registry_auth_file_path = None;
        }
        if self.lib_file_to_wait_on_for_build.trim().is_empty() {
            self.lib_file_to_wait_on_for_build = "public-api.d.ts".to_string();
        }
    }

    pub fn naming(&self) -> LibraryNaming {
        LibraryNaming::new(&self.library_name_prefix, self.scope_name.as_deref())
    }

    /// Scope without its leading `@`, used as a directory name.
    pub fn scope_dir(&self) -> Option<&str> {
        self.scope_name
            .as_deref()
            .map(|s| s.trim_start_matches('@'))
            .filter(|s| !s.is_empty())
    }

    /// Directory whose sub-directories are the library projects.
    pub fn libraries_root(&self) -> PathBuf {
        let root = resolve_path(&self.workspace_root, &self.projects_path);
        match self.scope_dir() {
            Some(scope) => root.join(scope),
            None => root,
        }
    }

    pub fn dist_root(&self) -> PathBuf {
        resolve_path(&self.workspace_root, &self.dist_path)
    }

    /// Directory holding the build output of already-built libraries.
    pub fn scoped_dist_root(&self) -> PathBuf {
        match self.scope_dir() {
            Some(scope) => self.dist_root().join(scope),
            None => self.dist_root(),
        }
    }

    pub fn manifest_file(&self) -> PathBuf {
        resolve_path(&self.workspace_root, &self.manifest_path)
    }

    pub fn path_map_file(&self) -> PathBuf {
        resolve_path(&self.workspace_root, &self.path_map_path)
    }

    pub fn registry_auth_file(&self) -> Option<PathBuf> {
        self.registry_auth_file_path
            .as_ref()
            .map(|p| resolve_path(&self.workspace_root, p))
    }

    /// Source directory of a library (prefixed directory name).
    pub fn library_dir(&self, library: &str) -> PathBuf {
        self.libraries_root().join(library)
    }

    /// Build output directory of a library.
    pub fn library_dist_dir(&self, library: &str) -> PathBuf {
        self.dist_root().join(self.naming().to_scoped_fs_path(library))
    }

    /// File that exists once `library` has finished building.
    pub fn build_marker(&self, library: &str) -> PathBuf {
        self.library_dist_dir(library)
            .join(&self.lib_file_to_wait_on_for_build)
    }

    /// The local-source entry a library's path-map list must end with.
    pub fn local_source_mapping(&self, library: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(scope) = self.scope_dir() {
            parts.push(scope);
        }
        parts.push(library);
        parts.push(&self.library_entry_file);
        join_slash(&self.projects_path, &parts)
    }

    /// Path-map entry pointing at a library's build output.
    pub fn dist_mapping(&self, library: &str) -> String {
        let scoped = self.naming().to_scoped_fs_path(library);
        let scoped = scoped.to_string_lossy().replace('\\', "/");
        join_slash(&self.dist_path, &[scoped.as_str()])
    }
}

/// Joins `path` onto `root` unless it is already absolute, dropping `.` parts.
pub fn resolve_path(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let mut resolved = root.to_path_buf();
    for component in path.components() {
        if component != Component::CurDir {
            resolved.push(component);
        }
    }
    resolved
}

/// Forward-slash join used for paths written into JSON documents.
fn join_slash(base: &Path, parts: &[&str]) -> String {
    let base = base.to_string_lossy().replace('\\', "/");
    let mut joined = base.trim_end_matches('/').to_string();
    for part in parts {
        joined.push('/');
        joined.push_str(part.trim_matches('/'));
    }
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_source_mapping_with_scope() {
        let config = WorkspaceConfig {
            scope_name: Some("@acme".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.local_source_mapping("lib-foo"),
            "./projects/acme/lib-foo/src/public-api.ts"
        );
        assert_eq!(config.dist_mapping("lib-foo"), "./dist/acme/lib-foo");
    }

    #[test]
    fn test_resolve_path_skips_cur_dir() {
        let resolved = resolve_path(Path::new("/ws"), Path::new("./projects"));
        assert_eq!(resolved, PathBuf::from("/ws/projects"));
        let absolute = resolve_path(Path::new("/ws"), Path::new("/elsewhere"));
        assert_eq!(absolute, PathBuf::from("/elsewhere"));
    }
}
