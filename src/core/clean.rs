//! Clean logic
//!
//! Removes the documentation output directory, including build logs.

use std::path::{Path, PathBuf};

use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanResult {
    /// Directory that was targeted
    pub path: PathBuf,
    /// Whether it existed and was removed
    pub removed: bool,
}

/// Remove the output directory if it exists
pub fn clean_output(output_dir: &Path) -> Result<CleanResult, FilesystemError> {
    let removed = filesystem::remove_dir_all(output_dir)?;
    if removed {
        tracing::info!("Removed {}", output_dir.display());
    } else {
        tracing::debug!("Nothing to clean at {}", output_dir.display());
    }

    Ok(CleanResult {
        path: output_dir.to_path_buf(),
        removed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_project() -> TempDir {
        TempDir::new().expect("Failed to create temp directory")
    }

    #[test]
    fn test_clean_removes_output_directory() {
        let project = create_test_project();
        let output_dir = project.path().join("_build/docs");
        std::fs::create_dir_all(output_dir.join("core")).unwrap();
        std::fs::write(output_dir.join("core/index.html"), "<html/>").unwrap();

        let result = clean_output(&output_dir).unwrap();

        assert!(result.removed);
        assert!(!output_dir.exists());
        assert!(project.path().join("_build").exists());
    }

    #[test]
    fn test_clean_succeeds_when_no_artifacts() {
        let project = create_test_project();
        let output_dir = project.path().join("_build/docs");

        let result = clean_output(&output_dir).unwrap();

        assert!(!result.removed);
        assert_eq!(result.path, output_dir);
    }
}
