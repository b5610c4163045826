//! Manifest and path-map synchronization.

use anyhow::{bail, Result};
use libkit_core::{synchronize_workspace, ProjectSet, WorkspaceConfig};

use crate::formatting::{
    print_error, print_key_value, print_section_header, print_success, print_warning,
    SectionStyle,
};

/// Reconciles both generated documents with the libraries on disk.
pub fn cmd_configs(config: &WorkspaceConfig) -> Result<()> {
    print_section_header("Synchronizing workspace configs", SectionStyle::Primary);

    let projects = ProjectSet::discover(config)?;
    let mut failures = 0;

    for outcome in synchronize_workspace(config, &projects) {
        match outcome {
            Ok(report) => {
                let title = format!("{} ({})", report.path.display(), report.kind.as_str());
                print_section_header(&title, SectionStyle::Secondary);
                if let Some(showcase) = &report.showcase {
                    print_key_value("Showcase", showcase);
                }
                print_key_value("Libraries", &report.libraries.join(", "));
                for key in &report.removed {
                    print_warning(&format!("Removed orphaned entry {}", key));
                }
                for key in &report.added {
                    print_warning(&format!("Added missing entry {}", key));
                }
                for fix in &report.fixes {
                    print_warning(fix);
                }
                if !report.changed() {
                    print_success("Already in sync");
                }
                println!();
            }
            Err(e) => {
                print_error(&e.to_string());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} document(s) could not be synchronized", failures);
    }
    Ok(())
}
