//! Settings management

use crate::ServiceError;
use glcaps_core::ContextConfiguration;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_FILE: &str = "glcaps.json";

/// Viewer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Reference database document
    pub reference_path: PathBuf,
    /// Where reports are written
    pub output_dir: PathBuf,
    /// Shared report repository stand-in; `None` disables submission
    pub submission_dir: Option<PathBuf>,
    pub submitter: Option<String>,
    /// Replaces the built-in fallback ladder when set
    pub candidates: Option<Vec<ContextConfiguration>>,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from("reference.json"),
            output_dir: PathBuf::from("reports"),
            submission_dir: None,
            submitter: None,
            candidates: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load from a JSON file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ServiceError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        serde_json::from_str(&text).map_err(|source| ServiceError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ServiceError> {
        let text = serde_json::to_string_pretty(self).map_err(|source| ServiceError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, text).map_err(|source| ServiceError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
