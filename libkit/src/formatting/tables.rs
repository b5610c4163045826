//! Table formatting utilities using comfy-table.

use comfy_table::{Cell, Table};
use libkit_core::{BuildCommandList, InvocationResult};
use owo_colors::OwoColorize;

use super::Status;

fn styled_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(*h).add_attribute(comfy_table::Attribute::Bold))
                .collect::<Vec<_>>(),
        )
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);
    table
}

/// Prints one row per invocation with its status and failure details.
pub fn print_result_table(results: &[InvocationResult]) {
    let mut table = styled_table(&["Status", "Library", "Details"]);

    for result in results {
        if result.success {
            table.add_row(vec![
                Cell::new(Status::Success.symbol()).fg(comfy_table::Color::Green),
                Cell::new(&result.label).fg(comfy_table::Color::White),
                Cell::new(""),
            ]);
        } else {
            let code = result
                .code
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "no exit code".to_string());
            let detail = if result.stderr.trim().is_empty() {
                format!("{}: {}", code, result.command)
            } else {
                format!("{}: {}\n{}", code, result.command, result.stderr.trim())
            };
            table.add_row(vec![
                Cell::new(Status::Error.symbol()).fg(comfy_table::Color::Red),
                Cell::new(&result.label).fg(comfy_table::Color::Red),
                Cell::new(detail).fg(comfy_table::Color::Red),
            ]);
        }
    }

    println!("{}", table);
}

/// Prints the planned commands, one row per invocation.
pub fn print_command_list(list: &BuildCommandList) {
    let mut table = styled_table(&["#", "Library", "Command"]);
    for (index, invocation) in list.invocations.iter().enumerate() {
        table.add_row(vec![
            Cell::new(index + 1).fg(comfy_table::Color::DarkGrey),
            Cell::new(&invocation.label).fg(comfy_table::Color::White),
            Cell::new(invocation.to_string()),
        ]);
    }
    println!("{}", table);
}

/// Prints a simple list of libraries (one per line).
pub fn print_library_list(libraries: &[String]) {
    if libraries.is_empty() {
        println!("  {} {}", "→".cyan(), "(none)".bright_black());
        return;
    }

    for library in libraries {
        println!("  {} {}", "→".cyan(), library.bold().white());
    }
}
