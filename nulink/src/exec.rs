use anyhow::{Context, Result, anyhow, bail};
use nulink_lib::{DeviceInfo, ExtractedMessage, NuLinkFlasher};
use strum::Display;

use crate::cli::{Commands, MergedConfig};

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
enum InfoField {
    #[strum(to_string = "Code Size")]
    CodeSize,
    #[strum(to_string = "UID")]
    Uid,
    #[strum(to_string = "CPU")]
    Cpu,
}

/// Execute a chip command against the flashing tool
pub fn execute_command(
    command: &Commands,
    flasher: &NuLinkFlasher,
    config: &MergedConfig,
) -> Result<()> {
    match command {
        Commands::Flash(params) => {
            let hex_file = config
                .hex_file_or(params.file.as_deref())
                .ok_or_else(|| anyhow!("No hex file given. Pass one or set `hex_file` in the config file."))?;
            flasher
                .flash(&hex_file)
                .with_context(|| format!("Failed to flash {}", hex_file))?;
            println!("Flashed {}", hex_file);
            Ok(())
        }
        Commands::Erase => {
            flasher.erase().context("Failed to erase chip")?;
            println!("Chip erased");
            Ok(())
        }
        Commands::Reset => {
            flasher.reset().context("Failed to reset chip")?;
            println!("Chip reset");
            Ok(())
        }
        Commands::Info(params) => {
            let hex_file = config.hex_file_or(params.file.as_deref());
            let info = flasher.get_info(hex_file.as_deref().map(std::path::Path::new));
            for line in format_info(&info) {
                println!("{line}");
            }
            if info.has_errors() {
                bail!("Some chip information could not be read");
            }
            Ok(())
        }
        Commands::Size(params) => print_code_size(&params.file),
    }
}

/// Code size only; needs no tool
pub fn print_code_size(hex_file: &str) -> Result<()> {
    let size = nulink_lib::compute_code_size(hex_file)
        .with_context(|| format!("Failed to compute code size of {}", hex_file))?;
    println!("{}: {}", InfoField::CodeSize, size);
    Ok(())
}

fn field_line(field: InfoField, value: Result<String, &nulink_lib::Error>) -> String {
    match value {
        Ok(value) => format!("{field}: {value}"),
        Err(e) => format!("{field}: error: {e}"),
    }
}

// An uninterpretable answer shows as an empty field, not an error.
fn answer(message: &nulink_lib::Result<ExtractedMessage>) -> Result<String, &nulink_lib::Error> {
    message
        .as_ref()
        .map(|m| m.value().unwrap_or_default().to_string())
}

/// One line per field
pub fn format_info(info: &DeviceInfo) -> Vec<String> {
    let code_size = info
        .code_size
        .as_ref()
        .map(|size| size.map(|s| s.to_string()).unwrap_or_default());

    vec![
        field_line(InfoField::CodeSize, code_size),
        field_line(InfoField::Uid, answer(&info.uid)),
        field_line(InfoField::Cpu, answer(&info.cpu)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use nulink_lib::{CodeSize, Error, Operation};

    #[test]
    fn formats_complete_info() {
        let info = DeviceInfo {
            code_size: Ok(Some(CodeSize(2048))),
            uid: Ok(ExtractedMessage::Value("0x8A2F1C04".into())),
            cpu: Ok(ExtractedMessage::Value("MS51FB9AE".into())),
        };
        assert_eq!(
            format_info(&info),
            [
                "Code Size: 2048 bytes",
                "UID: 0x8A2F1C04",
                "CPU: MS51FB9AE"
            ]
        );
    }

    #[test]
    fn unknown_answer_is_blank() {
        let info = DeviceInfo {
            code_size: Ok(None),
            uid: Ok(ExtractedMessage::Unknown),
            cpu: Ok(ExtractedMessage::Value("MS51FB9AE".into())),
        };
        assert_eq!(
            format_info(&info),
            ["Code Size: ", "UID: ", "CPU: MS51FB9AE"]
        );
    }

    #[test]
    fn errors_are_reported_per_field() {
        let info = DeviceInfo {
            code_size: Err(Error::hex_parse(4, "byte count of `:ZZ` is not hexadecimal")),
            uid: Err(Error::ExternalTool {
                operation: Operation::ReadUid,
                status: Some(1),
                stderr: "ICP connect fail".into(),
            }),
            cpu: Ok(ExtractedMessage::Value("MS51FB9AE".into())),
        };
        let lines = format_info(&info);

        assert!(lines[0].starts_with("Code Size: error: hex parse error at line 4"));
        assert!(lines[1].starts_with("UID: error: "));
        assert!(lines[1].ends_with("ICP connect fail"));
        assert_eq!(lines[2], "CPU: MS51FB9AE");
    }
}
