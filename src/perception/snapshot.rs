//! JSON snapshot loader for perception output.

use super::{PerceptionData, PerceptionSource};
use crate::error::{Result, VigaError};
use std::path::{Path, PathBuf};

/// Reads a perception snapshot written by the external detector/OCR process.
///
/// The file is re-read on every `perceive` call so each pipeline run sees the
/// latest frame.
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PerceptionSource for SnapshotSource {
    fn perceive(&self) -> Result<PerceptionData> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            VigaError::Perception(format!("Failed to read {}: {}", self.path.display(), e))
        })?;

        let data: PerceptionData = serde_json::from_str(&raw).map_err(|e| {
            VigaError::Perception(format!("Invalid snapshot {}: {}", self.path.display(), e))
        })?;

        log::debug!(
            "Loaded snapshot {}: {} layouts, {} elements, {} text",
            self.path.display(),
            data.layouts.len(),
            data.elements.len(),
            data.text.len()
        );

        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_perceive_reads_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("frame.json");
        fs::write(
            &path,
            r#"{"layouts": [], "elements": [{"box": [1, 2, 3, 4], "confidence": 0.7, "class": "button"}], "text": []}"#,
        )
        .unwrap();

        let data = SnapshotSource::new(&path).perceive().unwrap();
        assert_eq!(data.elements.len(), 1);
        assert_eq!(data.elements[0].bbox, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_perceive_missing_file() {
        let err = SnapshotSource::new("does-not-exist.json").perceive().unwrap_err();
        assert!(matches!(err, VigaError::Perception(_)));
        assert!(err.to_string().contains("does-not-exist.json"));
    }

    #[test]
    fn test_perceive_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        fs::write(&path, "{ layouts: ").unwrap();

        let err = SnapshotSource::new(&path).perceive().unwrap_err();
        assert!(matches!(err, VigaError::Perception(_)));
    }
}
