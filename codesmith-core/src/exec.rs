//! Guarded execution of generated code
//!
//! Code is written to a uniquely named temporary file and run in a child
//! process under a wall-clock limit. The file is removed on every exit path,
//! including timeout; the child is killed when the limit expires. There is no
//! sandboxing beyond the timeout and process isolation - generated code runs
//! with the caller's privileges.

use crate::error::{Error, ErrorKind, Result};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Default wall-clock limit for one execution
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one guarded execution.
///
/// Timeout is its own variant rather than a failure so callers can message it
/// distinctly. Spawn and temp-file problems surface as `Error`s instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    /// The child exited 0
    Success { stdout: String },
    /// The child exited non-zero (or was killed by a signal: `code` is None)
    NonZeroExit { code: Option<i32>, stderr: String },
    /// The child was killed after exceeding the wall-clock limit
    TimedOut { limit: Duration },
}

/// Runs generated code in a child interpreter process
#[derive(Debug, Clone)]
pub struct Executor {
    interpreter: Vec<String>,
    suffix: String,
    limit: Duration,
    dir: Option<PathBuf>,
}

impl Executor {
    /// Python executor with the default limit
    pub fn python() -> Self {
        Self::with_interpreter(&["python3"], ".py")
    }

    /// Pick an executor from a fence language tag.
    ///
    /// Unknown tags (and no tag at all) fall back to python.
    pub fn for_language(tag: Option<&str>) -> Self {
        match tag.map(str::to_ascii_lowercase).as_deref() {
            Some("sh") | Some("bash") | Some("shell") => Self::with_interpreter(&["sh"], ".sh"),
            Some("javascript") | Some("js") | Some("node") => {
                Self::with_interpreter(&["node"], ".js")
            }
            _ => Self::python(),
        }
    }

    /// Executor for an explicit interpreter argv and script suffix
    pub fn with_interpreter(interpreter: &[&str], suffix: &str) -> Self {
        Self {
            interpreter: interpreter.iter().map(|s| s.to_string()).collect(),
            suffix: suffix.to_string(),
            limit: DEFAULT_TIMEOUT,
            dir: None,
        }
    }

    /// Override the wall-clock limit
    pub fn with_timeout(mut self, limit: Duration) -> Self {
        self.limit = limit;
        self
    }

    /// Create the transient script files in `dir` instead of the system
    /// temp directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// The interpreter binary this executor invokes
    pub fn interpreter(&self) -> &str {
        &self.interpreter[0]
    }

    /// Write `code` to a transient file and run it, capturing output.
    ///
    /// Only one execution is in flight at a time; callers await the result
    /// before starting another.
    pub async fn run(&self, code: &str) -> Result<ExecOutcome> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("codesmith-").suffix(&self.suffix);

        // The guard removes the file when it drops, on every path below
        let mut script = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| Error::from(e).with_operation("exec::write_script"))?;

        script
            .write_all(code.as_bytes())
            .map_err(|e| Error::from(e).with_operation("exec::write_script"))?;
        script
            .flush()
            .map_err(|e| Error::from(e).with_operation("exec::write_script"))?;

        let mut cmd = Command::new(&self.interpreter[0]);
        cmd.args(&self.interpreter[1..])
            .arg(script.path())
            .kill_on_drop(true);

        match timeout(self.limit, cmd.output()).await {
            // Limit expired; dropping the output future kills the child
            Err(_) => Ok(ExecOutcome::TimedOut { limit: self.limit }),
            Ok(Err(e)) => Err(Error::new(
                ErrorKind::ExecFailed,
                format!("failed to run {}: {}", self.interpreter[0], e),
            )
            .with_operation("exec::run")
            .with_context("interpreter", self.interpreter[0].clone())
            .set_source(e)),
            Ok(Ok(output)) => {
                if output.status.success() {
                    Ok(ExecOutcome::Success {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    })
                } else {
                    Ok(ExecOutcome::NonZeroExit {
                        code: output.status.code(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    })
                }
            }
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::python()
    }
}
