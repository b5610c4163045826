//! In-memory representation of external commands.
//!
//! Commands stay structured while they are planned and are only turned into
//! a shell string by [`Invocation::to_shell_string`] right before dispatch.

use std::fmt;
use std::path::{Path, PathBuf};

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().to_string())
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_shell_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote(&self.program));
        parts.extend(self.args.iter().map(|a| quote(a)));
        parts.join(" ")
    }
}

/// Blocks until every listed file exists. Polled by the external waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitCondition {
    pub waiter: String,
    pub files: Vec<PathBuf>,
    pub delay_ms: Option<u64>,
}

impl WaitCondition {
    pub fn to_command(&self) -> ShellCommand {
        let mut command = ShellCommand::new(&self.waiter);
        for file in &self.files {
            command = command.path_arg(file);
        }
        if let Some(delay) = self.delay_ms {
            command = command.arg("-d").arg(delay.to_string());
        }
        command
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Run(ShellCommand),
    WaitFor(WaitCondition),
}

impl Step {
    pub fn to_shell_string(&self) -> String {
        match self {
            Step::Run(command) => command.to_shell_string(),
            Step::WaitFor(condition) => condition.to_command().to_shell_string(),
        }
    }
}

impl From<ShellCommand> for Step {
    fn from(command: ShellCommand) -> Self {
        Step::Run(command)
    }
}

impl From<WaitCondition> for Step {
    fn from(condition: WaitCondition) -> Self {
        Step::WaitFor(condition)
    }
}

/// A chain of steps run in order for one library; a failing step stops the
/// chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Library (or `serve`) this invocation belongs to, used in diagnostics.
    pub label: String,
    pub working_dir: Option<PathBuf>,
    pub steps: Vec<Step>,
}

impl Invocation {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            working_dir: None,
            steps: Vec::new(),
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    pub fn steps<I>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = Step>,
    {
        self.steps.extend(steps);
        self
    }

    pub fn prepend(&mut self, step: impl Into<Step>) {
        self.steps.insert(0, step.into());
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn wait_conditions(&self) -> impl Iterator<Item = &WaitCondition> {
        self.steps.iter().filter_map(|step| match step {
            Step::WaitFor(condition) => Some(condition),
            Step::Run(_) => None,
        })
    }

    pub fn commands(&self) -> impl Iterator<Item = &ShellCommand> {
        self.steps.iter().filter_map(|step| match step {
            Step::Run(command) => Some(command),
            Step::WaitFor(_) => None,
        })
    }

    pub fn to_shell_string(&self) -> String {
        self.steps
            .iter()
            .map(Step::to_shell_string)
            .collect::<Vec<_>>()
            .join(" && ")
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.working_dir {
            Some(dir) => write!(f, "(in {}) {}", dir.display(), self.to_shell_string()),
            None => f.write_str(&self.to_shell_string()),
        }
    }
}

fn quote(arg: &str) -> String {
    let needs_quotes = arg.is_empty()
        || arg
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '&' | '|' | ';' | '$' | '`'));
    if needs_quotes {
        format!("\"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}
