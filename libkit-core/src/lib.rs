//! Core library for orchestrating the libraries of a front-end workspace.

pub mod command;
pub mod config;
pub mod discovery;
pub mod error;
pub mod naming;
pub mod orchestrator;
pub mod package;
pub mod planner;
pub mod runner;
pub mod sync;
pub mod toolchain;

pub use command::{Invocation, ShellCommand, Step, WaitCondition};
pub use config::{WorkspaceConfig, DEFAULT_OPTIONS_FILE};
pub use discovery::{list_projects, ProjectSet};
pub use error::{Error, Result};
pub use naming::LibraryNaming;
pub use orchestrator::{execute, BuildCommandList, BuildOptions, Orchestrator};
pub use package::PackageDescriptor;
pub use planner::{DependencyStatus, DependencyWaitPlan, WaitPlanner};
pub use runner::{BatchReport, CommandRunner, InvocationResult, OutputHandler, ShellRunner};
pub use sync::{synchronize, synchronize_workspace, DocumentKind, EntryFixup, SyncReport};
pub use toolchain::Toolchain;
