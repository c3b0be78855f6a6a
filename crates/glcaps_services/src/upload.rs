//! Report submission
//!
//! The shared report repository is reached through [`UploadSink`]. The only
//! implementation here stores reports as files in a directory, one per
//! device/driver key.

use crate::ServiceError;
use glcaps_core::ReportKey;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Stored at the given location
    Stored(String),
    /// A report with the same key is already in the repository
    AlreadyPresent,
}

pub trait UploadSink {
    /// Whether a report for this device and driver was submitted before
    fn contains(&self, key: &ReportKey) -> Result<bool, ServiceError>;

    /// Submit serialized report text. Never overwrites an existing report.
    fn submit(
        &mut self,
        key: &ReportKey,
        text: &str,
        submitter: Option<&str>,
    ) -> Result<SubmitOutcome, ServiceError>;
}

/// Stores reports as `<slug>.json` in one directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &ReportKey) -> PathBuf {
        self.root.join(format!("{}.json", key.slug()))
    }
}

impl UploadSink for DirectorySink {
    fn contains(&self, key: &ReportKey) -> Result<bool, ServiceError> {
        let path = self.path_for(key);
        path.try_exists().map_err(|source| ServiceError::Read { path, source })
    }

    fn submit(
        &mut self,
        key: &ReportKey,
        text: &str,
        submitter: Option<&str>,
    ) -> Result<SubmitOutcome, ServiceError> {
        if self.contains(key)? {
            tracing::info!(report = %key, "Report already present, not submitting");
            return Ok(SubmitOutcome::AlreadyPresent);
        }
        fs::create_dir_all(&self.root).map_err(|source| ServiceError::Write {
            path: self.root.clone(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, text).map_err(|source| ServiceError::Write {
            path: path.clone(),
            source,
        })?;
        tracing::info!(
            report = %key,
            submitter = submitter.unwrap_or("anonymous"),
            path = %path.display(),
            "Report submitted"
        );
        Ok(SubmitOutcome::Stored(path.display().to_string()))
    }
}
