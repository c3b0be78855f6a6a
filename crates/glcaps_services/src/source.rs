//! Reference database sources

use glcaps_core::ReferenceSource;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Reads the reference document from a local file
#[derive(Debug, Clone)]
pub struct FileReferenceSource {
    path: PathBuf,
}

impl FileReferenceSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReferenceSource for FileReferenceSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&mut self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}
