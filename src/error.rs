//! Error types for the harness

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while configuring the harness or talking to external tools.
///
/// Every variant is fatal: the harness never retries or recovers from any of them.
#[derive(Debug, Error)]
pub enum HarnessError {
    // Configuration errors
    #[error("Environment variable(s) must be set: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("unknown tag: {0}")]
    UnknownTag(String),

    #[error("Invalid path '{}': {message}", .path.display())]
    InvalidPath { path: PathBuf, message: String },

    #[error("Required tool '{0}' was not found on PATH")]
    ToolNotFound(String),

    // External process errors
    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {}\nstdout:\n{stdout}\nstderr:\n{stderr}", exit_label(.exit_code))]
    CommandFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("'{command}' did not finish within {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },

    // Data errors
    #[error("Failed to decode JSON from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl HarnessError {
    /// True for the errors that stem from bad configuration rather than a failing image.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            HarnessError::MissingEnv(_)
                | HarnessError::UnknownTag(_)
                | HarnessError::InvalidPath { .. }
                | HarnessError::ToolNotFound(_)
        )
    }
}
