use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable that overrides the default install location.
pub const TOOL_ENV_VAR: &str = "NULINK_TOOL";

/// Where the vendor installer puts the 8051 command tool.
pub const DEFAULT_TOOL_PATH: &str =
    r"C:\Program Files (x86)\Nuvoton Tools\NuLink Command Tool\NuLink_8051OT.exe";

/// Path of the external flashing executable.
///
/// Resolved once at startup and then treated as read-only configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolLocation(PathBuf);

impl ToolLocation {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Like [`ToolLocation::new`] but the file must exist.
    pub fn existing(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_file() {
            Ok(Self(path))
        } else {
            Err(Error::tool_not_found(format!(
                "`{}` does not exist or is not a file",
                path.display()
            )))
        }
    }

    /// Find the tool: `$NULINK_TOOL` first, then the vendor default path.
    pub fn detect() -> Result<Self> {
        if let Some(path) = env::var_os(TOOL_ENV_VAR).filter(|p| !p.is_empty()) {
            tracing::debug!("using {} from {}", Path::new(&path).display(), TOOL_ENV_VAR);
            return Self::existing(path);
        }

        let default = Path::new(DEFAULT_TOOL_PATH);
        if default.is_file() {
            tracing::debug!("using default tool path {}", default.display());
            return Ok(Self::new(default));
        }

        Err(Error::tool_not_found(format!(
            "set {TOOL_ENV_VAR} or pass the tool path explicitly (default `{DEFAULT_TOOL_PATH}` not present)"
        )))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ToolLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ToolLocation {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_rejects_missing_file() {
        let err = ToolLocation::existing("/definitely/not/here/NuLink_8051OT").unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }

    #[test]
    fn existing_accepts_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let location = ToolLocation::existing(file.path()).unwrap();
        assert_eq!(location.path(), file.path());
    }

    #[test]
    fn existing_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ToolLocation::existing(dir.path()).is_err());
    }
}
