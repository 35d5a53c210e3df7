use std::io;
use std::path::Path;
use std::process::Stdio;

use linker_core::{LinkError, LinkErrorKind};
use linker_logging::{linker_debug, linker_trace};
use thiserror::Error;

/// Captured result of one git invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GitOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("{program}: program not found")]
    NotFound { program: String },
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

impl From<GitError> for LinkError {
    fn from(err: GitError) -> Self {
        let kind = match &err {
            GitError::NotFound { .. } => LinkErrorKind::ToolNotFound,
            GitError::Spawn { .. } => LinkErrorKind::Command,
        };
        LinkError::new(kind, err.to_string())
    }
}

/// Runs git. Each call is one external process; callers await it before issuing the next.
#[async_trait::async_trait]
pub trait GitRunner: Send + Sync {
    async fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError>;
}

/// `GitRunner` backed by the real git binary.
#[derive(Debug, Clone)]
pub struct CommandGitRunner {
    program: String,
    envs: Vec<(String, String)>,
}

impl CommandGitRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            envs: Vec::new(),
        }
    }

    /// Adds an environment variable for every invocation (e.g. `GIT_AUTHOR_NAME`).
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

impl Default for CommandGitRunner {
    fn default() -> Self {
        Self::new("git")
    }
}

#[async_trait::async_trait]
impl GitRunner for CommandGitRunner {
    async fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<GitOutput, GitError> {
        let mut command = tokio::process::Command::new(&self.program);
        command
            .args(args)
            // Credential prompts would block forever without a terminal.
            .env("GIT_TERMINAL_PROMPT", "0")
            // Error classification matches English messages.
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }
        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        linker_debug!("{} {} (cwd {:?})", self.program, args.join(" "), dir);
        let output = command.output().await.map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                GitError::NotFound {
                    program: self.program.clone(),
                }
            } else {
                GitError::Spawn {
                    program: self.program.clone(),
                    source,
                }
            }
        })?;

        let result = GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        linker_trace!(
            "exit={:?} stdout={} stderr={}",
            result.code,
            linker_logging::one_line(&result.stdout),
            linker_logging::one_line(&result.stderr)
        );
        Ok(result)
    }
}
