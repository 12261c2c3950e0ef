//! Drive a Nuvoton 8051 microcontroller through the NuLink command tool.
//!
//! [`NuLinkFlasher`] is the entry point: flash a hex file, erase, reset, or
//! read the code size, UID and CPU id in one go. The external tool is a black
//! box reached through its command line and console output only.
//!
//! ```no_run
//! use nulink_lib::{NuLinkFlasher, ToolLocation};
//!
//! let flasher = NuLinkFlasher::new(ToolLocation::detect()?);
//! flasher.erase()?;
//! flasher.flash("firmware.hex")?;
//! flasher.reset()?;
//! # Ok::<(), nulink_lib::Error>(())
//! ```

pub mod command;
pub mod error;
pub mod flasher;
pub mod hex_size;
pub mod invoker;
pub mod location;
pub mod progress;
pub mod response;

pub use command::{Operation, ToolCommand};
pub use error::{Error, Result};
pub use flasher::{DeviceInfo, NuLinkFlasher};
pub use hex_size::{CodeSize, compute_code_size};
pub use invoker::{ProcessRunner, ToolOutput, ToolRunner, invoke};
pub use location::ToolLocation;
pub use response::{ExtractedMessage, extract};
