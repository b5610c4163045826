//! Command implementations for the CLI.

mod build;
mod configs;
mod library;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Result};
use libkit_core::{execute, BatchReport, BuildCommandList, ShellRunner, WorkspaceConfig};
use owo_colors::OwoColorize;

use crate::formatting::{
    create_progress_bar, format_duration, print_command_list, print_result_table,
    print_section_header, print_separator_with_spacing, print_success, print_summary_box,
    print_warning, SectionStyle,
};

pub use build::cmd_build;
pub use configs::cmd_configs;
pub use library::{cmd_add, cmd_pack, cmd_publish, cmd_remove};

fn create_runner(config: &WorkspaceConfig) -> ShellRunner {
    ShellRunner::new(&config.workspace_root).with_output_handler(Arc::new(
        |label: &str, line: &str, is_stderr: bool| {
            let prefix = format!("[{}]", label);
            if is_stderr {
                eprintln!("  {} {}", prefix.bright_black().bold(), line.bright_red());
            } else {
                println!("  {} {}", prefix.bright_black().bold(), line);
            }
        },
    ))
}

/// Prints the planned commands, runs them unless `dry_run`, and fails if any
/// invocation failed.
fn run_command_list(
    config: &WorkspaceConfig,
    list: &BuildCommandList,
    title: &str,
    dry_run: bool,
) -> Result<Option<BatchReport>> {
    let start = Instant::now();
    print_section_header(title, SectionStyle::Primary);
    print_command_list(list);
    println!();

    if list.is_empty() {
        print_warning("Nothing to run");
        return Ok(None);
    }
    if dry_run {
        print_success("Dry run: no commands were executed");
        return Ok(None);
    }

    let runner = create_runner(config);
    let report = if list.concurrent {
        execute(list, &runner, |_| {})?
    } else {
        let pb = create_progress_bar(list.len() as u64);
        let report = execute(list, &runner, |result| {
            pb.set_message(result.label.clone());
            pb.inc(1);
            if !result.stdout.trim().is_empty() {
                pb.suspend(|| println!("{}", result.stdout.trim_end()));
            }
        })?;
        pb.finish_and_clear();
        report
    };

    print_section_header("Results", SectionStyle::Primary);
    print_result_table(&report.results);
    print_separator_with_spacing();
    print_summary_box(
        "Summary",
        &[
            ("Duration", &format_duration(start.elapsed().as_secs_f64())),
            ("Succeeded", &report.succeeded().to_string()),
            ("Failed", &(report.len() - report.succeeded()).to_string()),
        ],
    );
    println!();

    if !report.is_success() {
        bail!(
            "{} of {} commands failed",
            report.len() - report.succeeded(),
            report.len()
        );
    }
    print_success("All Done :)");
    Ok(Some(report))
}
