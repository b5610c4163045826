//! Conversions between bare, prefixed and scoped library names.

use std::path::{Path, PathBuf};

/// Name transforms for one workspace's prefix and scope settings.
///
/// A library has three spellings: bare (`foo`), prefixed (`lib-foo`) and
/// scoped (`@acme/lib-foo`, or `acme/lib-foo` on disk). Every transform here
/// is total and idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryNaming {
    prefix: String,
    scope: Option<String>,
}

impl LibraryNaming {
    pub fn new(prefix: &str, scope: Option<&str>) -> Self {
        let scope = scope
            .map(|s| s.trim().trim_start_matches('@').trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(|s| format!("@{}", s));
        Self {
            prefix: prefix.to_string(),
            scope,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Scope including its `@`, if configured.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    fn scope_dir(&self) -> Option<&str> {
        self.scope.as_deref().map(|s| &s[1..])
    }

    /// Prepends the prefix unless `name` already carries it.
    pub fn to_prefixed(&self, name: &str) -> String {
        if name.starts_with(&self.prefix) {
            name.to_string()
        } else {
            format!("{}{}", self.prefix, name)
        }
    }

    pub fn unprefix(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            return name.to_string();
        }
        name.strip_prefix(&self.prefix).unwrap_or(name).to_string()
    }

    /// `@scope/name` when a scope is configured, `name` otherwise.
    pub fn to_registry_name(&self, name: &str) -> String {
        match self.scope() {
            Some(scope) => {
                let bare = self.from_scoped_registry_name(name);
                format!("{}/{}", scope, bare)
            }
            None => name.to_string(),
        }
    }

    /// Strips a leading `@scope/` if present.
    pub fn from_scoped_registry_name(&self, name: &str) -> String {
        match self.scope() {
            Some(scope) => name
                .strip_prefix(scope)
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or(name)
                .to_string(),
            None => name.to_string(),
        }
    }

    /// `scope/name` as a relative path when a scope is configured.
    pub fn to_scoped_fs_path(&self, name: &str) -> PathBuf {
        match self.scope_dir() {
            Some(dir) => {
                let unscoped = self.from_scoped_registry_name(name);
                let bare = unscoped
                    .strip_prefix(dir)
                    .and_then(|rest| rest.strip_prefix(|c: char| c == '/' || c == '\\'))
                    .unwrap_or(unscoped.as_str());
                Path::new(dir).join(bare)
            }
            None => PathBuf::from(name),
        }
    }

    /// Inverse of [`LibraryNaming::to_scoped_fs_path`].
    pub fn from_scoped_fs_path(&self, path: &Path) -> String {
        let relative = match self.scope_dir() {
            Some(dir) => path.strip_prefix(dir).unwrap_or(path),
            None => path,
        };
        relative.to_string_lossy().replace('\\', "/")
    }
}

/// Splits positional arguments on commas into normalized library names.
pub fn split_library_args<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| {
            arg.as_ref()
                .split(',')
                .map(|part| part.trim().to_lowercase())
                .collect::<Vec<_>>()
        })
        .filter(|part| !part.is_empty())
        .collect()
}
