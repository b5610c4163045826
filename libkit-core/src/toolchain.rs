//! External programs the workspace delegates to.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::command::{ShellCommand, WaitCondition};

/// Program names for the build tool, package manager and file utilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Toolchain {
    pub build_tool: String,
    pub package_manager: String,
    pub remover: String,
    pub waiter: String,
    pub copier: String,
    pub serve_args: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            build_tool: "ng".to_string(),
            package_manager: "npm".to_string(),
            remover: "rimraf".to_string(),
            waiter: "wait-on".to_string(),
            copier: if cfg!(windows) { "copy" } else { "cp" }.to_string(),
            serve_args: vec!["--vendor-source-map".to_string()],
        }
    }
}

impl Toolchain {
    pub fn build(&self, registry_name: &str, watch: bool) -> ShellCommand {
        let command = ShellCommand::new(&self.build_tool)
            .arg("build")
            .arg(registry_name);
        if watch {
            command.arg("--watch")
        } else {
            command
        }
    }

    pub fn serve(&self) -> ShellCommand {
        ShellCommand::new(&self.build_tool)
            .arg("serve")
            .args(self.serve_args.iter().cloned())
    }

    pub fn generate_library(&self, registry_name: &str) -> ShellCommand {
        ShellCommand::new(&self.build_tool).args(["generate", "library", registry_name])
    }

    pub fn pack(&self) -> ShellCommand {
        ShellCommand::new(&self.package_manager).arg("pack")
    }

    pub fn publish(&self, public: bool) -> ShellCommand {
        let command = ShellCommand::new(&self.package_manager).arg("publish");
        if public {
            command.args(["--access", "public"])
        } else {
            command
        }
    }

    pub fn remove(&self, path: &Path) -> ShellCommand {
        ShellCommand::new(&self.remover).path_arg(path)
    }

    pub fn copy(&self, from: &Path, to: &Path) -> ShellCommand {
        ShellCommand::new(&self.copier).path_arg(from).path_arg(to)
    }

    pub fn wait_for(&self, files: Vec<PathBuf>, delay_ms: Option<u64>) -> WaitCondition {
        WaitCondition {
            waiter: self.waiter.clone(),
            files,
            delay_ms,
        }
    }
}
