use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;

use strum::Display;

use crate::location::ToolLocation;
use crate::{Error, Result};

/// Operations understood by the NuLink command tool.
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    WriteAprom,
    EraseAll,
    Reset,
    ReadUid,
    ReadCpu,
}

impl Operation {
    /// Fixed flags passed to the tool for this operation.
    pub fn flags(self) -> &'static [&'static str] {
        match self {
            Operation::WriteAprom => &["-w", "APROM"],
            Operation::EraseAll => &["-e", "ALL"],
            Operation::Reset => &["-reset"],
            Operation::ReadUid => &["-r", "UID"],
            Operation::ReadCpu => &["-p"],
        }
    }

    /// Number of payload arguments appended after the flags.
    pub fn payload_len(self) -> usize {
        match self {
            Operation::WriteAprom => 1,
            _ => 0,
        }
    }
}

/// Fully built argument vector: the executable followed by its flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    operation: Operation,
    argv: Vec<OsString>,
}

impl ToolCommand {
    /// Build the command line for `operation`.
    ///
    /// `args` is the operation payload: the hex file for
    /// [`Operation::WriteAprom`], empty for everything else.
    pub fn new<S: AsRef<OsStr>>(
        location: &ToolLocation,
        operation: Operation,
        args: &[S],
    ) -> Result<Self> {
        if args.len() != operation.payload_len() {
            return Err(Error::invalid_input(format!(
                "{operation} takes {} argument(s), got {}",
                operation.payload_len(),
                args.len()
            )));
        }
        if args.iter().any(|a| a.as_ref().is_empty()) {
            return Err(Error::invalid_input(format!(
                "{operation} argument must not be empty"
            )));
        }

        let mut argv = Vec::with_capacity(1 + operation.flags().len() + args.len());
        argv.push(location.path().as_os_str().to_os_string());
        argv.extend(operation.flags().iter().map(OsString::from));
        argv.extend(args.iter().map(|a| a.as_ref().to_os_string()));

        Ok(Self { operation, argv })
    }

    pub fn write_aprom(location: &ToolLocation, hex_file: &Path) -> Result<Self> {
        Self::new(location, Operation::WriteAprom, &[hex_file])
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn program(&self) -> &OsStr {
        &self.argv[0]
    }

    pub fn args(&self) -> &[OsString] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[OsString] {
        &self.argv
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arg in &self.argv {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
