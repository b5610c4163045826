//! Works out what a library has to wait for before its own build can start.

use std::collections::HashSet;
use std::fmt;

use tracing::{info, warn};

use crate::command::{ShellCommand, Step, WaitCondition};
use crate::config::WorkspaceConfig;
use crate::discovery::ProjectSet;
use crate::error::Result;
use crate::naming::LibraryNaming;
use crate::package::PackageDescriptor;

/// Build state of an in-workspace peer dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyStatus {
    /// Has build output and is not part of this invocation.
    Built,
    /// Built by this same invocation.
    Building,
    /// No build output and not targeted; built first, synchronously.
    Unbuilt,
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DependencyStatus::Built => "Built",
            DependencyStatus::Building => "Building",
            DependencyStatus::Unbuilt => "Unbuilt - WILL BUILD FIRST",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDependency {
    pub name: String,
    pub status: DependencyStatus,
}

/// Pre-build commands and the wait condition for one target library.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DependencyWaitPlan {
    pub library: String,
    pub dependencies: Vec<PlannedDependency>,
    pub prebuild: Vec<ShellCommand>,
    pub wait_for: Option<WaitCondition>,
}

impl DependencyWaitPlan {
    fn empty(library: &str) -> Self {
        Self {
            library: library.to_string(),
            ..Default::default()
        }
    }

    pub fn with_status(&self, status: DependencyStatus) -> impl Iterator<Item = &str> {
        self.dependencies
            .iter()
            .filter(move |d| d.status == status)
            .map(|d| d.name.as_str())
    }

    pub fn status_of(&self, name: &str) -> Option<DependencyStatus> {
        self.dependencies
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.status)
    }

    /// Steps to splice in ahead of the library's own build.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps: Vec<Step> = self.prebuild.iter().cloned().map(Step::Run).collect();
        if let Some(condition) = &self.wait_for {
            steps.push(Step::WaitFor(condition.clone()));
        }
        steps
    }

    pub fn is_empty(&self) -> bool {
        self.prebuild.is_empty() && self.wait_for.is_none()
    }
}

/// Plans dependency waits across one invocation.
///
/// Unbuilt dependencies shared by several targets are scheduled for a
/// pre-build only once; later targets just wait on the marker file.
pub struct WaitPlanner<'a> {
    config: &'a WorkspaceConfig,
    projects: &'a ProjectSet,
    naming: LibraryNaming,
    scheduled: HashSet<String>,
}

impl<'a> WaitPlanner<'a> {
    pub fn new(config: &'a WorkspaceConfig, projects: &'a ProjectSet) -> Self {
        Self {
            config,
            projects,
            naming: config.naming(),
            scheduled: HashSet::new(),
        }
    }

    /// Libraries already scheduled for a pre-build in this invocation.
    pub fn scheduled(&self) -> &HashSet<String> {
        &self.scheduled
    }

    pub fn plan(
        &mut self,
        library: &str,
        all_targets: &[String],
        unbuilt: &ProjectSet,
    ) -> Result<DependencyWaitPlan> {
        let descriptor = match PackageDescriptor::read(&self.config.library_dir(library)) {
            Ok(descriptor) => descriptor,
            Err(e) if e.is_missing_path() => {
                warn!("{}; no dependencies to wait on for {}", e, library);
                return Ok(DependencyWaitPlan::empty(library));
            }
            Err(e) => return Err(e),
        };

        let mut names: Vec<String> = Vec::new();
        for peer in descriptor.peer_dependency_names() {
            let name = self.naming.from_scoped_registry_name(peer);
            if name != library && self.projects.contains(&name) && !names.contains(&name) {
                names.push(name);
            }
        }

        if names.is_empty() {
            return Ok(DependencyWaitPlan::empty(library));
        }

        let dependencies: Vec<PlannedDependency> = names
            .into_iter()
            .map(|name| {
                let status = if all_targets.iter().any(|t| t == &name) {
                    DependencyStatus::Building
                } else if unbuilt.contains(&name) {
                    DependencyStatus::Unbuilt
                } else {
                    DependencyStatus::Built
                };
                PlannedDependency { name, status }
            })
            .collect();

        info!(
            "Found {} lib dependencies in {}: {}",
            dependencies.len(),
            library,
            dependencies
                .iter()
                .map(|d| format!("{} (Currently {})", d.name, d.status))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut prebuild = Vec::new();
        for dependency in &dependencies {
            if dependency.status != DependencyStatus::Unbuilt {
                continue;
            }
            if self.scheduled.insert(dependency.name.clone()) {
                let registry_name = self.naming.to_registry_name(&dependency.name);
                prebuild.push(self.config.tools.build(&registry_name, false));
            }
        }

        let markers = dependencies
            .iter()
            .map(|d| self.config.build_marker(&d.name))
            .collect();

        Ok(DependencyWaitPlan {
            library: library.to_string(),
            dependencies,
            prebuild,
            wait_for: Some(self.config.tools.wait_for(markers, None)),
        })
    }
}
