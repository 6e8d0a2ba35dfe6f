use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::Result;

pub const SEGMENT_FILE: &str = "index.seg";
const SEGMENT_TMP_FILE: &str = "index.seg.tmp";
const LOCK_FILE: &str = ".lock";

/// Files that make up one index directory
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,      // Root directory
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        StorageLayout {
            base_dir: base_dir.into(),
        }
    }

    /// Same as `new`, creating the directory if needed.
    pub fn create(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let layout = StorageLayout::new(base_dir);
        fs::create_dir_all(&layout.base_dir)?;
        Ok(layout)
    }

    pub fn segment_path(&self) -> PathBuf {
        self.base_dir.join(SEGMENT_FILE)
    }

    pub fn temp_segment_path(&self) -> PathBuf {
        self.base_dir.join(SEGMENT_TMP_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.base_dir.join(LOCK_FILE)
    }

    pub fn has_segment(&self) -> bool {
        self.segment_path().is_file()
    }

    /// Files a reader needs; everything else in the directory is scratch.
    pub fn published_files(&self) -> Vec<PathBuf> {
        vec![self.segment_path()]
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}
