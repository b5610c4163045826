//! Process execution for planned invocations.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use crate::command::Invocation;
use crate::error::{Error, Result};

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub label: String,
    /// Shell string that was run, for reproducing failures by hand.
    pub command: String,
    /// Exit code; `None` when the process was killed by a signal or never started.
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn into_error(self) -> Option<Error> {
        if self.success {
            return None;
        }
        Some(Error::ExternalCommand {
            label: self.label,
            command: self.command,
            code: self.code,
            stderr: self.stderr,
        })
    }

    fn spawn_failure(invocation: &Invocation, command: String, message: String) -> Self {
        Self {
            label: invocation.label.clone(),
            command,
            code: None,
            success: false,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// Results of a batch, in invocation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub results: Vec<InvocationResult>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &InvocationResult> {
        self.results.iter().filter(|r| !r.success)
    }

    pub fn is_success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs invocations. Implemented by [`ShellRunner`] and by test doubles.
pub trait CommandRunner {
    /// Runs one invocation to completion.
    fn run(&self, invocation: &Invocation) -> Result<InvocationResult>;

    /// Starts every invocation at once and joins on all of them. A failing
    /// invocation does not stop its siblings.
    fn run_concurrent(&self, invocations: &[Invocation]) -> Result<BatchReport>;
}

/// Receives `(label, line, is_stderr)` for each line a concurrent invocation prints.
pub type OutputHandler = Arc<dyn Fn(&str, &str, bool) + Send + Sync>;

/// Runs invocations through the platform shell.
#[derive(Clone)]
pub struct ShellRunner {
    workspace_root: PathBuf,
    on_output: OutputHandler,
}

impl ShellRunner {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            on_output: Arc::new(|label: &str, line: &str, is_stderr: bool| {
                if is_stderr {
                    error!(target: "libkit::output", "[{}] {}", label, line);
                } else {
                    info!(target: "libkit::output", "[{}] {}", label, line);
                }
            }),
        }
    }

    pub fn with_output_handler(mut self, handler: OutputHandler) -> Self {
        self.on_output = handler;
        self
    }

    fn working_dir(&self, invocation: &Invocation) -> PathBuf {
        invocation
            .working_dir
            .clone()
            .unwrap_or_else(|| self.workspace_root.clone())
    }

    async fn run_streaming(
        invocation: Invocation,
        working_dir: PathBuf,
        on_output: OutputHandler,
    ) -> InvocationResult {
        let command = invocation.to_shell_string();
        let (shell, flag) = shell();
        let spawned = tokio::process::Command::new(shell)
            .arg(flag)
            .arg(&command)
            .current_dir(&working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                return InvocationResult::spawn_failure(
                    &invocation,
                    command,
                    format!("Failed to spawn command: {}", e),
                )
            }
        };

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let label = invocation.label.clone();

        let stdout_task = {
            let label = label.clone();
            let on_output = Arc::clone(&on_output);
            tokio::spawn(async move {
                let mut collected = String::new();
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        on_output(&label, &line, false);
                        collected.push_str(&line);
                        collected.push('\n');
                    }
                }
                collected
            })
        };

        let stderr_task = {
            let label = label.clone();
            let on_output = Arc::clone(&on_output);
            tokio::spawn(async move {
                let mut collected = String::new();
                if let Some(stderr) = stderr {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        on_output(&label, &line, true);
                        collected.push_str(&line);
                        collected.push('\n');
                    }
                }
                collected
            })
        };

        let status = child.wait().await;
        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        match status {
            Ok(status) => InvocationResult {
                label,
                command,
                code: status.code(),
                success: status.success(),
                stdout,
                stderr,
            },
            Err(e) => InvocationResult::spawn_failure(
                &invocation,
                command,
                format!("Failed to wait on command: {}", e),
            ),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(&self, invocation: &Invocation) -> Result<InvocationResult> {
        let command = invocation.to_shell_string();
        let working_dir = self.working_dir(invocation);
        debug!(label = %invocation.label, dir = %working_dir.display(), "running {}", command);

        let (shell, flag) = shell();
        let output = match Command::new(shell)
            .arg(flag)
            .arg(&command)
            .current_dir(&working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                let result = InvocationResult::spawn_failure(
                    invocation,
                    command,
                    format!("Failed to spawn command: {}", e),
                );
                log_result(&result);
                return Ok(result);
            }
        };

        let result = InvocationResult {
            label: invocation.label.clone(),
            command,
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        log_result(&result);
        Ok(result)
    }

    fn run_concurrent(&self, invocations: &[Invocation]) -> Result<BatchReport> {
        let rt = tokio::runtime::Runtime::new().map_err(|e| Error::Spawn {
            label: "runtime".to_string(),
            message: format!("Failed to create tokio runtime: {}", e),
        })?;

        let results = rt.block_on(async {
            let mut handles = Vec::with_capacity(invocations.len());
            for invocation in invocations {
                let invocation = invocation.clone();
                let working_dir = self.working_dir(&invocation);
                let on_output = Arc::clone(&self.on_output);
                handles.push(tokio::spawn(Self::run_streaming(
                    invocation,
                    working_dir,
                    on_output,
                )));
            }

            let mut results = Vec::with_capacity(handles.len());
            for (handle, invocation) in handles.into_iter().zip(invocations) {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => InvocationResult::spawn_failure(
                        invocation,
                        invocation.to_shell_string(),
                        format!("Task panicked or was cancelled: {}", e),
                    ),
                };
                log_result(&result);
                results.push(result);
            }
            results
        });

        Ok(BatchReport { results })
    }
}

fn log_result(result: &InvocationResult) {
    if result.success {
        debug!(label = %result.label, "command finished");
        return;
    }
    let code = result
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "none".to_string());
    error!(
        "Command for {} failed (exit code: {}): {}\n{}",
        result.label,
        code,
        result.command,
        result.stderr.trim()
    );
}

fn shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::command::ShellCommand;

    #[test]
    fn test_run_reports_exit_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(dir.path());
        let invocation = Invocation::new("lib-a").step(ShellCommand::new("exit").arg("3"));

        let result = runner.run(&invocation).unwrap();
        assert!(!result.success);
        assert_eq!(result.code, Some(3));
    }

    #[test]
    fn test_run_concurrent_joins_all() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = ShellRunner::new(dir.path());
        let invocations = vec![
            Invocation::new("ok").step(ShellCommand::new("echo").arg("hello")),
            Invocation::new("fails").step(ShellCommand::new("false")),
            Invocation::new("ok-too").step(ShellCommand::new("true")),
        ];

        let report = runner.run_concurrent(&invocations).unwrap();
        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.results[0].stdout, "hello\n");
        assert_eq!(report.failed().next().map(|r| r.label.as_str()), Some("fails"));
    }
}
