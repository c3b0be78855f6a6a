//! Comparator and report builder
//!
//! Classifies every entry of a [`CapabilitySet`] against the reference
//! database. Pure: the same set, database and submission always produce the
//! same report.

use crate::context::Api;
use crate::model::{CapabilitySet, CapabilityValue, Category, ValueKind};
use crate::reference::{Expectation, Number, ReferenceDatabase, ReferenceRecord};
use crate::report::{Report, Submission};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of comparing one observation with its reference record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Supported,
    PartiallySupported,
    Unsupported,
    NotInReference,
}

impl Classification {
    pub const ALL: [Classification; 4] = [
        Classification::Supported,
        Classification::PartiallySupported,
        Classification::Unsupported,
        Classification::NotInReference,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Classification::Supported => "supported",
            Classification::PartiallySupported => "partial",
            Classification::Unsupported => "unsupported",
            Classification::NotInReference => "not in reference",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classified observation, one per capability set entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub name: String,
    pub category: Category,
    pub kind: ValueKind,
    pub classification: Classification,
    pub observed: CapabilityValue,
    /// Expectation that was applied, absent for `NotInReference`
    pub expected: Option<Expectation>,
}

/// Classify one observation against one expectation.
///
/// Absent observations (unavailable, zero, false, empty) are `Unsupported`.
/// Present observations that fall short of, or do not match, the expectation
/// are `PartiallySupported`; this includes a value of the wrong type.
pub fn classify(observed: &CapabilityValue, expected: &Expectation) -> Classification {
    if !observed.is_present() {
        return Classification::Unsupported;
    }

    let satisfied = match expected {
        Expectation::Present => true,
        Expectation::Equals { value } => value.matches(observed),
        Expectation::AtLeast { value } => {
            Number::from_value(observed).is_some_and(|n| n >= *value)
        }
        Expectation::Range { min, max } => {
            Number::from_value(observed).is_some_and(|n| n >= *min && n <= *max)
        }
        Expectation::ListAtLeast { values } => match observed {
            CapabilityValue::List(have) => {
                have.len() >= values.len() && have.iter().zip(values).all(|(h, want)| h >= want)
            }
            _ => false,
        },
        Expectation::Format(required) => match observed {
            CapabilityValue::Format(have) => {
                if have.contains(required) {
                    true
                } else if have.intersects(required) {
                    return Classification::PartiallySupported;
                } else {
                    return Classification::Unsupported;
                }
            }
            _ => false,
        },
    };

    if satisfied {
        Classification::Supported
    } else {
        Classification::PartiallySupported
    }
}

fn classify_against_record(
    set: &CapabilitySet,
    observed: &CapabilityValue,
    record: &ReferenceRecord,
) -> (Classification, Expectation) {
    let expected = record.expectation_for(&set.identity().vendor).clone();

    // `since` is a desktop GL version; capabilities newer than a desktop GL
    // context are only checked for presence
    let context = set.context();
    let predates = match (record.since, context.version) {
        (Some(since), Some(version)) if context.configuration.api == Api::Gl => version < since,
        _ => false,
    };
    let classification = if predates {
        if observed.is_present() {
            Classification::Supported
        } else {
            Classification::Unsupported
        }
    } else {
        classify(observed, &expected)
    };
    (classification, expected)
}

/// Build a report: one result per entry, in capability set order.
///
/// Without a reference database every result is `NotInReference`.
pub fn build(
    set: &CapabilitySet,
    reference: Option<&ReferenceDatabase>,
    submission: Submission,
) -> Report {
    let results: Vec<ComparisonResult> = set
        .entries()
        .iter()
        .map(|entry| {
            let record = reference.and_then(|db| db.get(&entry.name));
            let (classification, expected) = match record {
                Some(record) => {
                    let (classification, expected) =
                        classify_against_record(set, &entry.value, record);
                    (classification, Some(expected))
                }
                None => (Classification::NotInReference, None),
            };
            ComparisonResult {
                name: entry.name.clone(),
                category: entry.category,
                kind: entry.kind,
                classification,
                observed: entry.value.clone(),
                expected,
            }
        })
        .collect();

    let report = Report::new(
        set.identity().clone(),
        set.context().clone(),
        reference.map(ReferenceDatabase::version),
        set.extensions().to_vec(),
        results,
        submission,
    );
    let counts = report.counts();
    tracing::info!(
        supported = counts.supported,
        partial = counts.partially_supported,
        unsupported = counts.unsupported,
        not_in_reference = counts.not_in_reference,
        "Built capability report"
    );
    report
}
