//! glcaps Core
//!
//! Contains the driver-independent half of the capability viewer:
//! - Capability data model and context metadata
//! - Reference database loading
//! - Classification and report building
//! - Report interchange format, summaries and diffs

pub mod compare;
pub mod context;
pub mod diff;
pub mod error;
pub mod model;
pub mod reference;
pub mod report;
pub mod serialize;

pub use compare::{build, classify, Classification, ComparisonResult};
pub use context::{Api, ApiVersion, ContextConfiguration, ContextMetadata, PlatformFlags, Profile};
pub use error::{ModelError, ReferenceError, ReportError};
pub use model::{
    CapabilityEntry, CapabilitySet, CapabilitySetBuilder, CapabilityValue, Category, DeviceIdentity,
    FormatSupport, ValueKind,
};
pub use reference::{Expectation, ReferenceDatabase, ReferenceRecord, ReferenceSource};
pub use report::{ClassificationCounts, Report, ReportKey, Submission};

/// Generator version stamped into every report
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
