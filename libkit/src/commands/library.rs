//! Per-library commands: pack, publish, add and remove.

use anyhow::Result;
use libkit_core::{Orchestrator, WorkspaceConfig};

use super::{cmd_configs, run_command_list};

pub fn cmd_pack(config: &WorkspaceConfig, libraries: &[String], dry_run: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let targets = orchestrator.resolve_targets(libraries, true)?;
    let list = orchestrator.pack_commands(&targets);
    run_command_list(config, &list, "Packing libraries", dry_run)?;
    Ok(())
}

pub fn cmd_publish(config: &WorkspaceConfig, libraries: &[String], dry_run: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let targets = orchestrator.resolve_targets(libraries, true)?;
    let list = orchestrator.publish_commands(&targets);
    run_command_list(config, &list, "Publishing libraries", dry_run)?;
    Ok(())
}

/// Scaffolds new libraries; at least one name is required.
pub fn cmd_add(config: &WorkspaceConfig, libraries: &[String], dry_run: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let targets = orchestrator.resolve_targets(libraries, false)?;
    let list = orchestrator.add_commands(&targets);
    let outcome = run_command_list(config, &list, "Adding libraries", dry_run);
    sync_after(config, dry_run)?;
    outcome.map(|_| ())
}

pub fn cmd_remove(config: &WorkspaceConfig, libraries: &[String], dry_run: bool) -> Result<()> {
    let orchestrator = Orchestrator::new(config);
    let targets = orchestrator.resolve_targets(libraries, true)?;
    let list = orchestrator.remove_commands(&targets);
    let outcome = run_command_list(config, &list, "Removing libraries", dry_run);
    sync_after(config, dry_run)?;
    outcome.map(|_| ())
}

/// Structural changes leave the generated documents stale until synchronized.
fn sync_after(config: &WorkspaceConfig, dry_run: bool) -> Result<()> {
    if dry_run {
        return Ok(());
    }
    cmd_configs(config)
}
