use serde::{Deserialize, Serialize};

/// Default configuration values
pub struct Defaults;

impl Defaults {
    pub const QUIET: bool = false;
}

/// Root of the JSON configuration file.
///
/// ```json
/// {
///   "tool": "C:\\Tools\\NuLink_8051OT.exe",
///   "timeout_secs": 60,
///   "hex_file": "build/firmware.hex"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NuLinkConfig {
    /// Path of the NuLink command tool. Discovered when absent.
    #[serde(default)]
    pub tool: Option<String>,
    /// Kill the tool after this many seconds. Waits forever when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_quiet")]
    pub quiet: bool,
    /// Hex file used by `flash` and `info` when none is given on the command line.
    #[serde(default)]
    pub hex_file: Option<String>,
}

fn default_quiet() -> bool {
    Defaults::QUIET
}

impl NuLinkConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        let config: NuLinkConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// A configuration with every value at its default
    pub fn with_defaults() -> Self {
        Self {
            tool: None,
            timeout_secs: None,
            quiet: Defaults::QUIET,
            hex_file: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref tool) = self.tool
            && tool.trim().is_empty()
        {
            return Err("`tool` must not be empty".to_string());
        }

        if self.timeout_secs == Some(0) {
            return Err("`timeout_secs` must be greater than zero".to_string());
        }

        if let Some(ref hex_file) = self.hex_file
            && hex_file.trim().is_empty()
        {
            return Err("`hex_file` must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let config: NuLinkConfig = serde_json::from_str(
            r#"{"tool": "/opt/nulink/NuLink_8051OT", "timeout_secs": 30, "quiet": true, "hex_file": "fw.hex"}"#,
        )
        .unwrap();

        assert_eq!(config.tool.as_deref(), Some("/opt/nulink/NuLink_8051OT"));
        assert_eq!(config.timeout_secs, Some(30));
        assert!(config.quiet);
        assert_eq!(config.hex_file.as_deref(), Some("fw.hex"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_object_is_defaults() {
        let config: NuLinkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, NuLinkConfig::with_defaults());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_json::from_str::<NuLinkConfig>(r#"{"port": "COM3"}"#).is_err());
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let config = NuLinkConfig {
            timeout_secs: Some(0),
            ..NuLinkConfig::with_defaults()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_tool_is_invalid() {
        let config = NuLinkConfig {
            tool: Some("  ".into()),
            ..NuLinkConfig::with_defaults()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hex_file": "app.hex"}}"#).unwrap();

        let config = NuLinkConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.hex_file.as_deref(), Some("app.hex"));
        assert_eq!(config.tool, None);
    }
}
