//! Report aggregate

use crate::compare::{Classification, ComparisonResult};
use crate::context::ContextMetadata;
use crate::model::DeviceIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Submission metadata; opaque to the comparator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub timestamp: DateTime<Utc>,
    pub submitter: Option<String>,
    pub generator: String,
}

impl Submission {
    pub fn now(submitter: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            submitter,
            generator: format!("glcaps {}", crate::VERSION),
        }
    }
}

/// Identifies equivalent reports from the same device and driver
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportKey {
    pub vendor: String,
    pub renderer: String,
    pub driver_version: String,
}

impl ReportKey {
    /// Filesystem and URL friendly form
    pub fn slug(&self) -> String {
        let raw = format!("{}_{}_{}", self.vendor, self.renderer, self.driver_version);
        let mut slug = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('_') {
                slug.push('_');
            }
        }
        slug.trim_matches('_').to_string()
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} / {}", self.vendor, self.renderer, self.driver_version)
    }
}

/// Tally of classifications in a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassificationCounts {
    pub supported: usize,
    pub partially_supported: usize,
    pub unsupported: usize,
    pub not_in_reference: usize,
}

impl ClassificationCounts {
    pub fn get(&self, classification: Classification) -> usize {
        match classification {
            Classification::Supported => self.supported,
            Classification::PartiallySupported => self.partially_supported,
            Classification::Unsupported => self.unsupported,
            Classification::NotInReference => self.not_in_reference,
        }
    }

    pub fn total(&self) -> usize {
        self.supported + self.partially_supported + self.unsupported + self.not_in_reference
    }
}

/// Finished record of one device's capabilities and their classification.
///
/// Only the comparator and the deserializer construct reports; nothing
/// mutates one afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    identity: DeviceIdentity,
    context: ContextMetadata,
    reference_version: Option<u32>,
    extensions: Vec<String>,
    results: Vec<ComparisonResult>,
    submission: Submission,
}

impl Report {
    pub(crate) fn new(
        identity: DeviceIdentity,
        context: ContextMetadata,
        reference_version: Option<u32>,
        extensions: Vec<String>,
        results: Vec<ComparisonResult>,
        submission: Submission,
    ) -> Self {
        Self {
            identity,
            context,
            reference_version,
            extensions,
            results,
            submission,
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn context(&self) -> &ContextMetadata {
        &self.context
    }

    /// Version of the reference database used, `None` when it was unavailable
    pub fn reference_version(&self) -> Option<u32> {
        self.reference_version
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn results(&self) -> &[ComparisonResult] {
        &self.results
    }

    pub fn result(&self, name: &str) -> Option<&ComparisonResult> {
        self.results.iter().find(|r| r.name == name)
    }

    pub fn submission(&self) -> &Submission {
        &self.submission
    }

    pub fn key(&self) -> ReportKey {
        ReportKey {
            vendor: self.identity.vendor.clone(),
            renderer: self.identity.renderer.clone(),
            driver_version: self.identity.driver_version.clone(),
        }
    }

    pub fn counts(&self) -> ClassificationCounts {
        let mut counts = ClassificationCounts::default();
        for result in &self.results {
            match result.classification {
                Classification::Supported => counts.supported += 1,
                Classification::PartiallySupported => counts.partially_supported += 1,
                Classification::Unsupported => counts.unsupported += 1,
                Classification::NotInReference => counts.not_in_reference += 1,
            }
        }
        counts
    }
}
