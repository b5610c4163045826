mod commands;
mod formatting;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use libkit_core::{BuildOptions, WorkspaceConfig, DEFAULT_OPTIONS_FILE};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "libkit")]
#[command(about = "Build, serve, pack and publish the libraries of a front-end workspace")]
struct Cli {
    /// Command to run
    #[arg(value_enum)]
    command: CommandName,

    /// Library names, comma separated. Defaults to every library (except for `add`).
    libraries: Vec<String>,

    /// Options file
    #[arg(long, default_value = DEFAULT_OPTIONS_FILE)]
    config: PathBuf,

    /// Print the commands without running them
    #[arg(long, action)]
    dry_run: bool,

    /// Build libraries one after another instead of concurrently (`build` only)
    #[arg(long, action)]
    sequential: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[arg(short, long, action)]
    quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CommandName {
    Build,
    #[value(name = "build_watch")]
    BuildWatch,
    Pack,
    Publish,
    Add,
    Remove,
    Configs,
    Serve,
}

impl CommandName {
    /// `build_watch` builds once and then serves; `serve` also watches.
    fn build_options(self, sequential: bool) -> libkit_core::Result<Option<BuildOptions>> {
        let (watch, serve) = match self {
            CommandName::Build => (false, false),
            CommandName::BuildWatch => (false, true),
            CommandName::Serve => (true, true),
            _ => return Ok(None),
        };
        BuildOptions::new(watch, serve, !sequential).map(Some)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let build_options = cli.command.build_options(cli.sequential)?;
    let config = WorkspaceConfig::resolve(&cli.config)?;

    if let Some(options) = build_options {
        return commands::cmd_build(&config, &cli.libraries, options, cli.dry_run);
    }

    match cli.command {
        CommandName::Pack => commands::cmd_pack(&config, &cli.libraries, cli.dry_run)?,
        CommandName::Publish => commands::cmd_publish(&config, &cli.libraries, cli.dry_run)?,
        CommandName::Add => commands::cmd_add(&config, &cli.libraries, cli.dry_run)?,
        CommandName::Remove => commands::cmd_remove(&config, &cli.libraries, cli.dry_run)?,
        CommandName::Configs => commands::cmd_configs(&config)?,
        CommandName::Build | CommandName::BuildWatch | CommandName::Serve => {}
    }

    Ok(())
}
