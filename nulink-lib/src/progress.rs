//! Progress callbacks.
//!
//! The library never draws anything itself. Front ends implement
//! [`ProgressCallback`] to show each step however they like (terminal
//! spinners, log lines, a GUI status bar).

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::command::Operation;

/// What a step is doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressOperation {
    /// Running the external tool.
    Tool(Operation),
    /// Summing record sizes of a hex file.
    CodeSize { path: PathBuf },
}

impl fmt::Display for ProgressOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tool(Operation::WriteAprom) => f.write_str("Writing APROM"),
            Self::Tool(Operation::EraseAll) => f.write_str("Erasing chip"),
            Self::Tool(Operation::Reset) => f.write_str("Resetting chip"),
            Self::Tool(Operation::ReadUid) => f.write_str("Reading UID"),
            Self::Tool(Operation::ReadCpu) => f.write_str("Reading CPU id"),
            Self::CodeSize { path } => write!(f, "Computing code size of {}", path.display()),
        }
    }
}

/// How a step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Success,
    /// Finished, but the tool's answer could not be interpreted.
    NoAnswer,
    Failed(String),
}

/// State handed to [`ProgressCallback::start`].
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Step prefix, e.g. `0x03`.
    pub prefix: String,
    pub operation: ProgressOperation,
}

/// Progress bar ID type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

pub trait ProgressCallback: Send + Sync {
    fn start(&self, info: ProgressInfo) -> ProgressId;

    fn finish(&self, id: ProgressId, status: ProgressStatus);
}

/// Callback that prints nothing.
#[derive(Debug, Default)]
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn start(&self, _info: ProgressInfo) -> ProgressId {
        ProgressId(0)
    }

    fn finish(&self, _id: ProgressId, _status: ProgressStatus) {}
}

pub type ProgressCallbackArc = Arc<dyn ProgressCallback>;

pub fn no_op_progress_callback() -> ProgressCallbackArc {
    Arc::new(NoOpProgressCallback)
}

/// Numbers steps and hands out spinners.
pub struct ProgressHelper {
    callback: ProgressCallbackArc,
    step_counter: AtomicU32,
}

impl ProgressHelper {
    pub fn new(callback: ProgressCallbackArc) -> Self {
        Self {
            callback,
            step_counter: AtomicU32::new(0),
        }
    }

    fn next_step(&self) -> u32 {
        self.step_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn create_spinner(&self, operation: ProgressOperation) -> ProgressHandler {
        let info = ProgressInfo {
            prefix: format!("0x{:02X}", self.next_step()),
            operation,
        };
        let id = self.callback.start(info);
        ProgressHandler {
            callback: Arc::clone(&self.callback),
            id,
        }
    }

    pub fn current_step(&self) -> u32 {
        self.step_counter.load(Ordering::SeqCst)
    }
}

/// One running step. Finish it exactly once.
pub struct ProgressHandler {
    callback: ProgressCallbackArc,
    id: ProgressId,
}

impl ProgressHandler {
    pub fn finish(self, status: ProgressStatus) {
        self.callback.finish(self.id, status);
    }
}
