use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::command::{Operation, ToolCommand};
use crate::hex_size::{self, CodeSize};
use crate::invoker::{self, ProcessRunner, ToolOutput, ToolRunner};
use crate::location::ToolLocation;
use crate::progress::{
    ProgressCallbackArc, ProgressHelper, ProgressOperation, ProgressStatus,
    no_op_progress_callback,
};
use crate::response::{self, ExtractedMessage};
use crate::{Error, Result};

/// Result of [`NuLinkFlasher::get_info`]. Each field succeeds or fails on
/// its own.
#[derive(Debug)]
pub struct DeviceInfo {
    /// `Ok(None)` when no hex file was given.
    pub code_size: Result<Option<CodeSize>>,
    pub uid: Result<ExtractedMessage>,
    pub cpu: Result<ExtractedMessage>,
}

impl DeviceInfo {
    /// True if any field hit a hard error. `Unknown` answers do not count.
    pub fn has_errors(&self) -> bool {
        self.code_size.is_err() || self.uid.is_err() || self.cpu.is_err()
    }
}

/// Flash, erase, reset and query a chip through the NuLink command tool.
///
/// Stateless between calls: each operation is one request and one tool
/// run. Calls block until the tool exits. Tool runs are serialized, so
/// sharing one flasher between threads never starts two processes at once.
pub struct NuLinkFlasher {
    location: ToolLocation,
    runner: Box<dyn ToolRunner>,
    progress: ProgressHelper,
    invoke_lock: Mutex<()>,
}

impl NuLinkFlasher {
    pub fn new(location: ToolLocation) -> Self {
        Self::with_runner(location, Box::new(ProcessRunner::new()))
    }

    /// Run the tool through `runner`. Pass a
    /// [`ProcessRunner::with_timeout`] to bound how long the tool may run.
    pub fn with_runner(location: ToolLocation, runner: Box<dyn ToolRunner>) -> Self {
        Self {
            location,
            runner,
            progress: ProgressHelper::new(no_op_progress_callback()),
            invoke_lock: Mutex::new(()),
        }
    }

    pub fn progress_callback(mut self, callback: ProgressCallbackArc) -> Self {
        self.progress = ProgressHelper::new(callback);
        self
    }

    pub fn location(&self) -> &ToolLocation {
        &self.location
    }

    /// Write `hex_file` to APROM.
    pub fn flash(&self, hex_file: impl AsRef<Path>) -> Result<()> {
        let hex_file = hex_file.as_ref();
        if hex_file.as_os_str().is_empty() {
            return Err(Error::invalid_input("no hex file selected"));
        }
        let command = ToolCommand::write_aprom(&self.location, hex_file)?;
        self.run(&command, |_| ((), ProgressStatus::Success))
    }

    pub fn erase(&self) -> Result<()> {
        self.run_plain(Operation::EraseAll)
    }

    pub fn reset(&self) -> Result<()> {
        self.run_plain(Operation::Reset)
    }

    pub fn read_uid(&self) -> Result<ExtractedMessage> {
        self.query(Operation::ReadUid)
    }

    pub fn read_cpu(&self) -> Result<ExtractedMessage> {
        self.query(Operation::ReadCpu)
    }

    /// Code size of `hex_file`, UID and CPU id.
    ///
    /// All three are attempted even when an earlier one fails.
    pub fn get_info(&self, hex_file: Option<&Path>) -> DeviceInfo {
        let code_size = match hex_file.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => self.code_size(path).map(Some),
            None => Ok(None),
        };

        DeviceInfo {
            code_size,
            uid: self.read_uid(),
            cpu: self.read_cpu(),
        }
    }

    /// Code size of a hex file. Does not touch the tool.
    pub fn code_size(&self, hex_file: impl AsRef<Path>) -> Result<CodeSize> {
        let path = hex_file.as_ref();
        let spinner = self.progress.create_spinner(ProgressOperation::CodeSize {
            path: path.to_path_buf(),
        });

        let result = hex_size::compute_code_size(path);
        spinner.finish(match &result {
            Ok(_) => ProgressStatus::Success,
            Err(e) => ProgressStatus::Failed(e.to_string()),
        });
        result
    }

    fn query(&self, operation: Operation) -> Result<ExtractedMessage> {
        let command = ToolCommand::new(&self.location, operation, &[] as &[&str])?;
        self.run(&command, |output| {
            let message = response::extract(&output.stdout);
            let status = if message.is_unknown() {
                ProgressStatus::NoAnswer
            } else {
                ProgressStatus::Success
            };
            (message, status)
        })
    }

    fn run_plain(&self, operation: Operation) -> Result<()> {
        let command = ToolCommand::new(&self.location, operation, &[] as &[&str])?;
        self.run(&command, |_| ((), ProgressStatus::Success))
    }

    /// Run `command` under the invoke lock. `interpret` turns a successful
    /// run into the caller's value and the status shown for the step.
    fn run<T>(
        &self,
        command: &ToolCommand,
        interpret: impl FnOnce(ToolOutput) -> (T, ProgressStatus),
    ) -> Result<T> {
        let spinner = self
            .progress
            .create_spinner(ProgressOperation::Tool(command.operation()));

        let result = {
            // The guarded value is `()`, so a poisoned lock holds nothing broken.
            let _guard = self
                .invoke_lock
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            invoker::invoke(self.runner.as_ref(), command)
        };

        match result {
            Ok(output) => {
                let (value, status) = interpret(output);
                spinner.finish(status);
                Ok(value)
            }
            Err(e) => {
                spinner.finish(ProgressStatus::Failed(match e.tool_stderr() {
                    Some(stderr) => stderr.trim().to_string(),
                    None => e.to_string(),
                }));
                Err(e)
            }
        }
    }
}
