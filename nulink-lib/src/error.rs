use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::command::Operation;

/// Convenient result type for `nulink-lib`.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("hex parse error at line {line}: {reason}")]
    HexParse { line: usize, reason: String },

    /// The tool ran but reported failure. `stderr` is kept verbatim.
    #[error("{operation} failed ({}): {stderr}", exit_status(.status))]
    ExternalTool {
        operation: Operation,
        status: Option<i32>,
        stderr: String,
    },

    #[error("failed to launch `{}`: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("flashing tool not found: {0}")]
    ToolNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: Operation, after: Duration },
}

fn exit_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn hex_parse(line: usize, reason: impl Into<String>) -> Self {
        Self::HexParse {
            line,
            reason: reason.into(),
        }
    }

    pub fn tool_not_found(msg: impl Into<String>) -> Self {
        Self::ToolNotFound(msg.into())
    }

    /// Captured stderr of a failed tool run, if this error carries one.
    pub fn tool_stderr(&self) -> Option<&str> {
        match self {
            Self::ExternalTool { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
