//! Differences between two reports, e.g. before and after a driver update

use crate::compare::{Classification, ComparisonResult};
use crate::model::CapabilityValue;
use crate::report::Report;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added(CapabilityValue),
    Removed(CapabilityValue),
    Changed {
        before: CapabilityValue,
        after: CapabilityValue,
        before_class: Classification,
        after_class: Classification,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportDifference {
    pub name: String,
    pub change: Change,
}

impl fmt::Display for ReportDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.change {
            Change::Added(value) => write!(f, "+ {} = {}", self.name, value),
            Change::Removed(value) => write!(f, "- {} = {}", self.name, value),
            Change::Changed {
                before,
                after,
                before_class,
                after_class,
            } => {
                write!(f, "~ {}: {} -> {}", self.name, before, after)?;
                if before_class != after_class {
                    write!(f, " ({before_class} -> {after_class})")?;
                }
                Ok(())
            }
        }
    }
}

fn by_name(report: &Report) -> BTreeMap<&str, &ComparisonResult> {
    report.results().iter().map(|r| (r.name.as_str(), r)).collect()
}

/// Capabilities added, removed or changed going from `before` to `after`,
/// sorted by name
pub fn diff(before: &Report, after: &Report) -> Vec<ReportDifference> {
    let old = by_name(before);
    let new = by_name(after);
    let mut differences = Vec::new();

    for (name, was) in &old {
        match new.get(name) {
            None => differences.push(ReportDifference {
                name: name.to_string(),
                change: Change::Removed(was.observed.clone()),
            }),
            Some(now) if now.observed != was.observed || now.classification != was.classification => {
                differences.push(ReportDifference {
                    name: name.to_string(),
                    change: Change::Changed {
                        before: was.observed.clone(),
                        after: now.observed.clone(),
                        before_class: was.classification,
                        after_class: now.classification,
                    },
                })
            }
            Some(_) => {}
        }
    }
    for (name, now) in &new {
        if !old.contains_key(name) {
            differences.push(ReportDifference {
                name: name.to_string(),
                change: Change::Added(now.observed.clone()),
            });
        }
    }

    differences.sort_by(|a, b| a.name.cmp(&b.name));
    differences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::build;
    use crate::context::{Api, ContextConfiguration, ContextMetadata, Profile};
    use crate::model::{CapabilityEntry, CapabilitySet, Category, DeviceIdentity, ValueKind};
    use crate::reference::ReferenceDatabase;
    use crate::report::Submission;

    fn report(entries: &[(&str, i64)], db: Option<&ReferenceDatabase>) -> Report {
        let identity = DeviceIdentity {
            vendor: "ACME".to_string(),
            renderer: "R".to_string(),
            driver_version: "1".to_string(),
            vendor_id: None,
            device_id: None,
            backend: "Gl".to_string(),
        };
        let context = ContextMetadata {
            configuration: ContextConfiguration::new(Api::Gl, 4, 6, Profile::Core),
            version_string: "4.6".to_string(),
            version: None,
            degraded: false,
        };
        let mut builder = CapabilitySet::builder(identity, context);
        for (name, value) in entries {
            builder
                .push(CapabilityEntry::new(*name, Category::Limits, ValueKind::Integer, CapabilityValue::Integer(*value)))
                .unwrap();
        }
        build(&builder.build(), db, Submission::now(None))
    }

    #[test]
    fn test_identical_reports_have_no_differences() {
        let a = report(&[("GL_A", 1), ("GL_B", 2)], None);
        let b = report(&[("GL_A", 1), ("GL_B", 2)], None);
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_added_removed_changed() {
        let db = ReferenceDatabase::from_json(
            r#"{ "version": 1, "capabilities": { "GL_B": { "expected": { "kind": "at_least", "value": 4 } } } }"#,
        )
        .unwrap();
        let before = report(&[("GL_A", 1), ("GL_B", 2)], Some(&db));
        let after = report(&[("GL_B", 8), ("GL_C", 3)], Some(&db));
        let changes = diff(&before, &after);

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].name, "GL_A");
        assert!(matches!(changes[0].change, Change::Removed(_)));
        assert_eq!(changes[1].name, "GL_B");
        assert_eq!(
            changes[1].change,
            Change::Changed {
                before: CapabilityValue::Integer(2),
                after: CapabilityValue::Integer(8),
                before_class: Classification::PartiallySupported,
                after_class: Classification::Supported,
            }
        );
        assert_eq!(changes[1].to_string(), "~ GL_B: 2 -> 8 (partial -> supported)");
        assert!(matches!(changes[2].change, Change::Added(CapabilityValue::Integer(3))));
    }
}
