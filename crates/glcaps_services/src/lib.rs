//! glcaps Services Layer
//!
//! Platform glue around the engine: settings, where the reference database
//! comes from, where finished reports go, and console prompts.

pub mod confirm;
pub mod settings;
pub mod source;
pub mod upload;

use std::path::PathBuf;
use thiserror::Error;

pub use confirm::ConsoleConfirm;
pub use settings::Settings;
pub use source::FileReferenceSource;
pub use upload::{DirectorySink, SubmitOutcome, UploadSink};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
