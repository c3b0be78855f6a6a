//! Report interchange format
//!
//! Reports travel as pretty-printed JSON. Field order is fixed by the
//! struct definitions and results keep capability set order, so an
//! unchanged report always serializes to the same bytes.

use crate::compare::Classification;
use crate::error::ReportError;
use crate::model::{is_canonical_name, Category};
use crate::report::Report;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Structural checks shared by both directions
fn validate(report: &Report) -> Result<(), ReportError> {
    let identity = report.identity();
    if identity.vendor.trim().is_empty() {
        return Err(ReportError::Malformed("missing vendor".to_string()));
    }
    if identity.renderer.trim().is_empty() {
        return Err(ReportError::Malformed("missing renderer".to_string()));
    }
    if report.context().version_string.trim().is_empty() {
        return Err(ReportError::Malformed("missing context version".to_string()));
    }
    if report.results().is_empty() {
        return Err(ReportError::Malformed("report has no capabilities".to_string()));
    }

    let mut seen = BTreeSet::new();
    for result in report.results() {
        if !is_canonical_name(&result.name) {
            return Err(ReportError::Malformed(format!("invalid capability name {:?}", result.name)));
        }
        if !seen.insert(result.name.as_str()) {
            return Err(ReportError::Malformed(format!("duplicate capability {}", result.name)));
        }
        if !result.observed.is_finite() || !result.expected.as_ref().map_or(true, |e| e.is_finite()) {
            return Err(ReportError::Malformed(format!("non-finite value for {}", result.name)));
        }
        if (result.classification == Classification::NotInReference) != result.expected.is_none() {
            return Err(ReportError::Malformed(format!(
                "{}: expected value does not match classification {}",
                result.name, result.classification
            )));
        }
    }
    Ok(())
}

/// Encode a report. Refuses reports that could not be decoded again.
pub fn to_text(report: &Report) -> Result<String, ReportError> {
    validate(report)?;
    Ok(serde_json::to_string_pretty(report)?)
}

/// Decode a report, rejecting structurally invalid documents
pub fn from_text(text: &str) -> Result<Report, ReportError> {
    let report: Report =
        serde_json::from_str(text).map_err(|e| ReportError::Malformed(e.to_string()))?;
    validate(&report)?;
    Ok(report)
}

/// Human-readable view for terminals and logs
pub fn summary(report: &Report) -> String {
    let mut out = String::new();
    let identity = report.identity();
    let context = report.context();

    // Writing into a String cannot fail
    let _ = writeln!(out, "Device     {} / {}", identity.vendor, identity.renderer);
    let _ = writeln!(out, "Driver     {} ({})", identity.driver_version, identity.backend);
    let _ = writeln!(
        out,
        "Context    {} (reported {}){}",
        context.configuration.label(),
        context.version_string,
        if context.degraded { " [fallback]" } else { "" }
    );
    match report.reference_version() {
        Some(version) => {
            let _ = writeln!(out, "Reference  v{version}");
        }
        None => {
            let _ = writeln!(out, "Reference  unavailable, capabilities not classified");
        }
    }
    let submission = report.submission();
    let _ = writeln!(
        out,
        "Generated  {} by {}{}",
        submission.timestamp.to_rfc3339(),
        submission.generator,
        submission
            .submitter
            .as_deref()
            .map(|s| format!(" for {s}"))
            .unwrap_or_default()
    );

    let counts = report.counts();
    let tally: Vec<String> = Classification::ALL
        .iter()
        .map(|c| format!("{} {}", counts.get(*c), c.label()))
        .collect();
    let _ = writeln!(out, "Summary    {} capabilities: {}", counts.total(), tally.join(", "));

    let width = report
        .results()
        .iter()
        .map(|r| r.name.len())
        .max()
        .unwrap_or(0);
    for category in Category::ALL {
        let mut rows = report.results().iter().filter(|r| r.category == category).peekable();
        if rows.peek().is_none() {
            continue;
        }
        let _ = writeln!(out, "\n[{}]", category.label());
        for result in rows {
            let _ = write!(
                out,
                "  {:<width$}  {:<24}  {}",
                result.name,
                result.observed.to_string(),
                result.classification,
            );
            if let Some(expected) = &result.expected {
                let _ = write!(out, " (expected {expected})");
            }
            out.push('\n');
        }
    }
    out
}
