use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use crate::config::NuLinkConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "NuLink 8051 flashing CLI", long_about = None)]
pub struct Cli {
    /// JSON configuration file path
    #[arg(long = "config", short = 'f')]
    pub config: Option<String>,

    /// Path of the NuLink command tool (default: $NULINK_TOOL, then the vendor install path)
    #[arg(long = "tool", short = 't')]
    pub tool: Option<String>,

    /// Kill the tool after this many seconds (default: wait forever)
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Suppress progress output (default: false)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a hex file to APROM
    #[command(name = "flash")]
    Flash(Flash),

    /// Erase the whole chip
    #[command(name = "erase")]
    Erase,

    /// Reset the chip
    #[command(name = "reset")]
    Reset,

    /// Show code size of a hex file, chip UID and CPU id
    #[command(name = "info")]
    Info(Info),

    /// Show the code size of a hex file without touching the chip
    #[command(name = "size")]
    Size(Size),
}

#[derive(Parser, Debug, Clone)]
pub struct Flash {
    /// Intel HEX file (default: `hex_file` from the config file)
    pub file: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct Info {
    /// Intel HEX file whose code size is reported (default: `hex_file` from the config file)
    pub file: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct Size {
    /// Intel HEX file
    #[arg(required = true)]
    pub file: String,
}

/// CLI arguments merged over the configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedConfig {
    pub tool: Option<String>,
    pub timeout: Option<Duration>,
    pub quiet: bool,
    pub hex_file: Option<String>,
}

/// Merge CLI arguments with configuration file, CLI args take precedence
pub fn merge_config(args: &Cli, config: Option<NuLinkConfig>) -> Result<MergedConfig> {
    let base_config = config.unwrap_or_else(NuLinkConfig::with_defaults);

    let tool = args.tool.clone().or(base_config.tool);
    if tool.as_deref().is_some_and(|t| t.trim().is_empty()) {
        bail!("Tool path must not be empty");
    }

    let timeout_secs = args.timeout.or(base_config.timeout_secs);
    if timeout_secs == Some(0) {
        bail!("Timeout must be greater than zero");
    }

    Ok(MergedConfig {
        tool,
        timeout: timeout_secs.map(Duration::from_secs),
        quiet: args.quiet || base_config.quiet,
        hex_file: base_config.hex_file,
    })
}

impl MergedConfig {
    /// Hex file named on the command line, else the configured one.
    pub fn hex_file_or(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_owned)
            .or_else(|| self.hex_file.clone())
            .filter(|f| !f.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("nulink").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn parses_subcommands() {
        assert!(matches!(parse(&["erase"]).command, Commands::Erase));
        assert!(matches!(parse(&["reset"]).command, Commands::Reset));
        match parse(&["flash", "fw.hex"]).command {
            Commands::Flash(flash) => assert_eq!(flash.file.as_deref(), Some("fw.hex")),
            other => panic!("unexpected command: {other:?}"),
        }
        match parse(&["info"]).command {
            Commands::Info(info) => assert_eq!(info.file, None),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn size_requires_file() {
        assert!(Cli::try_parse_from(["nulink", "size"]).is_err());
    }

    #[test]
    fn cli_overrides_config() {
        let args = parse(&["--tool", "/usr/local/bin/nulink", "--timeout", "5", "reset"]);
        let config = NuLinkConfig {
            tool: Some("C:/NuLink_8051OT.exe".into()),
            timeout_secs: Some(60),
            quiet: false,
            hex_file: Some("cfg.hex".into()),
        };

        let merged = merge_config(&args, Some(config)).unwrap();
        assert_eq!(merged.tool.as_deref(), Some("/usr/local/bin/nulink"));
        assert_eq!(merged.timeout, Some(Duration::from_secs(5)));
        assert_eq!(merged.hex_file.as_deref(), Some("cfg.hex"));
    }

    #[test]
    fn config_fills_gaps() {
        let args = parse(&["-q", "erase"]);
        let config = NuLinkConfig {
            tool: Some("C:/NuLink_8051OT.exe".into()),
            ..NuLinkConfig::with_defaults()
        };

        let merged = merge_config(&args, Some(config)).unwrap();
        assert_eq!(merged.tool.as_deref(), Some("C:/NuLink_8051OT.exe"));
        assert_eq!(merged.timeout, None);
        assert!(merged.quiet);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let args = parse(&["--timeout", "0", "erase"]);
        assert!(merge_config(&args, None).is_err());
    }

    #[test]
    fn explicit_hex_file_wins() {
        let merged = merge_config(&parse(&["erase"]), None).unwrap();
        assert_eq!(merged.hex_file_or(Some("a.hex")).as_deref(), Some("a.hex"));
        assert_eq!(merged.hex_file_or(None), None);

        let merged = MergedConfig {
            hex_file: Some("cfg.hex".into()),
            ..merged
        };
        assert_eq!(merged.hex_file_or(None).as_deref(), Some("cfg.hex"));
        assert_eq!(merged.hex_file_or(Some("")), None);
    }
}
