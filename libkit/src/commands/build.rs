//! Build, watch and serve.

use anyhow::Result;
use libkit_core::{BuildOptions, Orchestrator, WorkspaceConfig};

use crate::formatting::{print_info, print_library_list};

use super::run_command_list;

pub fn cmd_build(
    config: &WorkspaceConfig,
    libraries: &[String],
    options: BuildOptions,
    dry_run: bool,
) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let targets = orchestrator.resolve_targets(libraries, true)?;

    print_info(&format!("Building {} libraries:", targets.len()));
    print_library_list(&targets);
    println!();

    let list = orchestrator.build_commands(&targets, options)?;
    let title = match (options.serve, options.watch) {
        (true, _) => "Building and serving libraries",
        (false, true) => "Building libraries in watch mode",
        (false, false) => "Building libraries",
    };
    run_command_list(config, &list, title, dry_run)?;
    Ok(())
}
