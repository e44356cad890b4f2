use std::fmt;
use std::path::{Path, PathBuf};

/// Failures raised while acquiring game resources.
///
/// None of these are fatal: every acquisition site logs the failure and
/// continues with degraded visuals, silence, or an empty level. A failed load
/// is never retried during the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadFailure {
    /// Missing or corrupt texture/audio/data file.
    ResourceLoad { path: PathBuf, reason: String },
    /// The level layout could not be opened; the level is played empty.
    LevelFileMissing { path: PathBuf, reason: String },
}

impl LoadFailure {
    pub fn resource(path: &Path, reason: impl Into<String>) -> Self {
        Self::ResourceLoad {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn level_missing(path: &Path, reason: impl Into<String>) -> Self {
        Self::LevelFileMissing {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::ResourceLoad { path, .. } | Self::LevelFileMissing { path, .. } => path,
        }
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceLoad { path, reason } => {
                write!(f, "Failed to load resource {}: {}", path.display(), reason)
            }
            Self::LevelFileMissing { path, reason } => {
                write!(f, "Could not open level file {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for LoadFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_path_and_reason() {
        let err = LoadFailure::resource(Path::new("assets/img/cloud.png"), "not found");
        let text = err.to_string();
        assert!(text.contains("assets/img/cloud.png"));
        assert!(text.contains("not found"));
    }

    #[test]
    fn level_missing_keeps_path() {
        let err = LoadFailure::level_missing(Path::new("level.dat"), "denied");
        assert_eq!(err.path(), Path::new("level.dat"));
        assert!(err.to_string().starts_with("Could not open level file"));
    }
}
