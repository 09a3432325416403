//! Shell execution for confirmed actions.
//!
//! Commands are free-form shell text from the model, so they run through
//! `<shell> -c` rather than as an argv array. Each output stream is read
//! through a bounded buffer; going over it fails the run and kills the child.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Default per-stream output limit (1 MiB).
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// Label placed before captured stderr in the combined output.
pub const STDERR_LABEL: &str = "STDERR:";

/// Returned instead of an empty string when a command prints nothing.
pub const NO_OUTPUT: &str = "<no output>";

/// Errors from running a command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to start {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command failed ({status}){}", stderr_suffix(.stderr))]
    NonZeroExit { status: ExitStatus, stderr: String },

    #[error("command output exceeded {limit} bytes")]
    OutputTooLarge { limit: usize },

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    let stderr = stderr.trim();
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

/// Runs shell commands and captures their output.
#[derive(Debug, Clone)]
pub struct Executor {
    shell: String,
    max_output_bytes: usize,
    timeout: Option<Duration>,
}

impl Default for Executor {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".to_string(),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
            timeout: None,
        }
    }
}

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl Executor {
    pub fn new(shell: impl Into<String>, max_output_bytes: usize, timeout: Option<Duration>) -> Self {
        Self {
            shell: shell.into(),
            max_output_bytes,
            timeout,
        }
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Run `command` and return the combined output.
    ///
    /// Without a configured timeout this waits for the child for as long as
    /// it runs.
    pub async fn execute(&self, command: &str) -> Result<String, ExecError> {
        debug!("Executing via {}: {}", self.shell, command);

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ExecError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        // An early return drops `child`, which kills it.
        let captured = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.capture(&mut child))
                .await
                .map_err(|_| ExecError::Timeout(limit))??,
            None => self.capture(&mut child).await?,
        };

        let stdout = String::from_utf8_lossy(&captured.stdout);
        let stderr = String::from_utf8_lossy(&captured.stderr);

        if !captured.status.success() {
            warn!("Command exited unsuccessfully: {}", captured.status);
            return Err(ExecError::NonZeroExit {
                status: captured.status,
                stderr: stderr.into_owned(),
            });
        }

        Ok(combine_output(&stdout, &stderr))
    }

    async fn capture(&self, child: &mut Child) -> Result<Captured, ExecError> {
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| std::io::Error::other("child stderr was not captured"))?;

        let (stdout, stderr) = tokio::try_join!(
            read_bounded(stdout, self.max_output_bytes),
            read_bounded(stderr, self.max_output_bytes),
        )?;
        let status = child.wait().await?;

        Ok(Captured {
            status,
            stdout,
            stderr,
        })
    }
}

/// Read a stream to EOF, failing as soon as it goes past `limit` bytes.
async fn read_bounded<R>(reader: R, limit: usize) -> Result<Vec<u8>, ExecError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut buf).await?;
    if buf.len() > limit {
        return Err(ExecError::OutputTooLarge { limit });
    }
    Ok(buf)
}

/// Join stdout and a labeled stderr block, or the placeholder if both are blank.
pub fn combine_output(stdout: &str, stderr: &str) -> String {
    let mut output = String::from(stdout);
    if !stderr.is_empty() {
        output.push('\n');
        output.push_str(STDERR_LABEL);
        output.push('\n');
        output.push_str(stderr);
    }
    if output.trim().is_empty() {
        return NO_OUTPUT.to_string();
    }
    output
}
