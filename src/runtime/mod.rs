//! Container runtime abstraction.
//!
//! Checks talk to containers only through [`ContainerRuntime`], so they can be
//! exercised against a scripted runtime in tests. [`DockerCli`] is the real
//! implementation and shells out to the `docker` binary.

use crate::error::HarnessError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

#[cfg(test)]
pub(crate) mod fake;

/// A `docker run` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    pub env: Vec<(String, String)>,
    pub command: Vec<String>,
    /// Piped to the container; also makes the run interactive
    pub stdin: Option<Vec<u8>>,
    pub timeout: Duration,
}

impl RunRequest {
    pub fn new<I, S>(image: impl Into<String>, command: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            env: Vec::new(),
            command: command.into_iter().map(Into::into).collect(),
            stdin: None,
            timeout,
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Arguments following the `docker` program name
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["run".to_string(), "--rm".to_string()];
        if self.stdin.is_some() {
            args.push("--interactive".to_string());
        }
        for (key, value) in &self.env {
            args.push("--env".to_string());
            args.push(format!("{}={}", key, value));
        }
        args.push(self.image.clone());
        args.extend(self.command.iter().cloned());
        args
    }
}

/// A `docker build` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub tag: String,
    pub timeout: Duration,
}

impl BuildRequest {
    pub fn to_args(&self) -> Vec<OsString> {
        vec![
            "build".into(),
            "-f".into(),
            self.dockerfile.clone().into_os_string(),
            "--tag".into(),
            self.tag.clone().into(),
            self.context.clone().into_os_string(),
        ]
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Capability to build images and run containers
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Run a container to completion; a non-zero exit or timeout is an error
    async fn run(&self, request: RunRequest) -> Result<ProcessOutput, HarnessError>;

    /// Build an image; a non-zero exit or timeout is an error
    async fn build(&self, request: BuildRequest) -> Result<ProcessOutput, HarnessError>;
}

/// [`ContainerRuntime`] backed by the docker command line client
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
    global_args: Vec<String>,
}

impl DockerCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            global_args: Vec::new(),
        }
    }

    /// Find `docker` on PATH
    pub fn locate() -> Result<Self, HarnessError> {
        let program =
            which::which("docker").map_err(|_| HarnessError::ToolNotFound("docker".to_string()))?;
        debug!("Using docker at {}", program.display());
        Ok(Self::new(program))
    }

    /// Arguments placed before every subcommand (e.g. `-H tcp://host:2375`)
    pub fn with_global_args(mut self, args: Vec<String>) -> Self {
        self.global_args = args;
        self
    }

    async fn execute(
        &self,
        args: Vec<OsString>,
        stdin: Option<Vec<u8>>,
        timeout: Duration,
    ) -> Result<ProcessOutput, HarnessError> {
        let label = describe(&self.program, &args);
        let program = self.program.display().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.global_args)
            .args(&args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Running command: {}", label);
        let mut child = cmd.spawn().map_err(|source| HarnessError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Feed stdin from its own task so a chatty child cannot block on a full stdout pipe
        let writer = match (stdin, child.stdin.take()) {
            (Some(input), Some(mut pipe)) => Some(tokio::spawn(async move {
                pipe.write_all(&input).await?;
                pipe.shutdown().await
            })),
            _ => None,
        };

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| HarnessError::Spawn {
                program: program.clone(),
                source,
            })?,
            Err(_) => {
                if let Some(writer) = writer {
                    writer.abort();
                }
                error!("Command timed out after {:?}: {}", timeout, label);
                return Err(HarnessError::Timeout {
                    command: label,
                    timeout,
                });
            }
        };

        let result = ProcessOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };

        if !output.status.success() {
            error!("Command failed: {}", label);
            error!("stdout:\n{}", result.stdout_text());
            error!("stderr:\n{}", result.stderr_text());
            return Err(HarnessError::CommandFailed {
                command: label,
                exit_code: result.exit_code,
                stdout: result.stdout_text(),
                stderr: result.stderr_text(),
            });
        }

        if let Some(writer) = writer {
            match writer.await.unwrap_or_else(|e| Err(std::io::Error::other(e))) {
                Ok(()) => {}
                // The child may exit without draining its input
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("stdin closed early by {}", program);
                }
                Err(source) => return Err(HarnessError::Spawn { program, source }),
            }
        }

        debug!("stdout:\n{}", result.stdout_text());
        debug!("stderr:\n{}", result.stderr_text());
        Ok(result)
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn run(&self, request: RunRequest) -> Result<ProcessOutput, HarnessError> {
        let args = request.to_args().into_iter().map(OsString::from).collect();
        self.execute(args, request.stdin, request.timeout).await
    }

    async fn build(&self, request: BuildRequest) -> Result<ProcessOutput, HarnessError> {
        info!("Building image {}", request.tag);
        self.execute(request.to_args(), None, request.timeout).await
    }
}

/// Render a command line for logs and errors with secret values masked
pub fn describe(program: &std::path::Path, args: &[OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    let mut after_env_flag = false;
    for arg in args {
        let arg = arg.to_string_lossy();
        let part = if after_env_flag {
            mask_env_assignment(&arg)
        } else {
            arg.to_string()
        };
        after_env_flag = arg == "--env" || arg == "-e";
        parts.push(part);
    }
    parts.join(" ")
}

fn mask_env_assignment(assignment: &str) -> String {
    match assignment.split_once('=') {
        Some((key, _)) if is_secret(key) => format!("{}=********", key),
        _ => assignment.to_string(),
    }
}

fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_uppercase();
    key.contains("PASSWORD") || key.contains("SECRET") || key.contains("TOKEN")
}
