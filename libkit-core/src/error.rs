//! Error types and result aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON in {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected document shape in {}: {message}", path.display())]
    InvalidDocument { path: PathBuf, message: String },

    #[error("Path not found: {}", .0.display())]
    MissingPath(PathBuf),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Command for {label} exited with {}: {command}\n{stderr}", exit_status(code))]
    ExternalCommand {
        label: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Failed to spawn command for {label}: {message}")]
    Spawn { label: String, message: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error only means something was absent on disk.
    pub fn is_missing_path(&self) -> bool {
        match self {
            Error::MissingPath(_) => true,
            Error::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

fn exit_status(code: &Option<i32>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string())
}

pub type Result<T> = std::result::Result<T, Error>;
