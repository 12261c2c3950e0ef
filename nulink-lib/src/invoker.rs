//! Running the external flashing tool.
//!
//! Every call spawns exactly one process and blocks until it exits. Without
//! a timeout a hung tool hangs the caller; with one, the child is killed
//! once the deadline passes.

use std::io::{ErrorKind, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::command::ToolCommand;
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything captured from one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    /// Exit code, `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            success: status.success(),
            status: status.code(),
            stdout: String::from_utf8_lossy(stdout).into_owned(),
            stderr: String::from_utf8_lossy(stderr).into_owned(),
        }
    }

    /// Turn a failed run into [`Error::ExternalTool`], keeping stderr as is.
    pub fn into_result(self, command: &ToolCommand) -> Result<ToolOutput> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::ExternalTool {
                operation: command.operation(),
                status: self.status,
                stderr: self.stderr,
            })
        }
    }
}

/// Executes a built command and captures its output.
///
/// A non-zero exit is not an error at this level; [`invoke`] decides that.
pub trait ToolRunner: Send + Sync {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(command: &ToolCommand) -> Result<Child> {
        Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: PathBuf::from(command.program()),
                source,
            })
    }

    fn wait_with_deadline(
        command: &ToolCommand,
        mut child: Child,
        timeout: Duration,
    ) -> Result<ToolOutput> {
        // Drain both pipes while polling so a chatty tool cannot block on a
        // full pipe buffer.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = wait_until(command, &mut child, Instant::now() + timeout, timeout)?;

        let stdout = collect(stdout)?;
        let stderr = collect(stderr)?;
        Ok(ToolOutput::from_parts(status, &stdout, &stderr))
    }
}

/// The parts of [`Child`] the deadline loop needs.
trait ChildHandle {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> std::io::Result<()>;
    fn wait(&mut self) -> std::io::Result<ExitStatus>;
}

impl ChildHandle for Child {
    fn try_wait(&mut self) -> std::io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> std::io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> std::io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Poll `child` until it exits. The child is killed and reaped on every
/// error path, so no process outlives the call.
fn wait_until<C: ChildHandle>(
    command: &ToolCommand,
    child: &mut C,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => {}
            Err(e) => {
                if let Err(reap_err) = reap(child) {
                    tracing::warn!("failed to reap {}: {}", command.operation(), reap_err);
                }
                return Err(e.into());
            }
        }

        if Instant::now() >= deadline {
            tracing::warn!(
                "{} did not finish within {:?}, killing it",
                command.operation(),
                timeout
            );
            reap(child)?;
            return Err(Error::Timeout {
                operation: command.operation(),
                after: timeout,
            });
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn reap<C: ChildHandle>(child: &mut C) -> std::io::Result<ExitStatus> {
    // InvalidInput means the child already exited.
    if let Err(e) = child.kill()
        && e.kind() != ErrorKind::InvalidInput
    {
        tracing::warn!("failed to kill tool: {}", e);
    }
    child.wait()
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<std::io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn collect(handle: Option<thread::JoinHandle<std::io::Result<Vec<u8>>>>) -> Result<Vec<u8>> {
    match handle {
        Some(handle) => handle
            .join()
            .map_err(|_| Error::Io(std::io::Error::other("output reader thread panicked")))?
            .map_err(Error::Io),
        None => Ok(Vec::new()),
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        let child = Self::spawn(command)?;

        match self.timeout {
            Some(timeout) => Self::wait_with_deadline(command, child, timeout),
            None => {
                let output = child.wait_with_output()?;
                Ok(ToolOutput::from_parts(
                    output.status,
                    &output.stdout,
                    &output.stderr,
                ))
            }
        }
    }
}

/// Run `command` once through `runner`.
///
/// A failing exit status becomes [`Error::ExternalTool`] with the captured
/// stderr; stdout of a failed run is never handed back. No retries.
pub fn invoke(runner: &dyn ToolRunner, command: &ToolCommand) -> Result<ToolOutput> {
    tracing::debug!("command: {}", command);

    let output = runner.run(command)?;
    tracing::debug!(
        "{} exited with {:?} ({} bytes stdout, {} bytes stderr)",
        command.operation(),
        output.status,
        output.stdout.len(),
        output.stderr.len()
    );
    tracing::trace!("stdout: {:?}", output.stdout);

    output.into_result(command)
}
