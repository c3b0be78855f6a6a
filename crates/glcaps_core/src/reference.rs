//! Reference capability database
//!
//! Versioned catalog of expected values, keyed by the same canonical names
//! the prober emits. Loaded once per session and never mutated.
//!
//! ```json
//! {
//!   "version": 3,
//!   "capabilities": {
//!     "GL_MAX_TEXTURE_SIZE": {
//!       "expected": { "kind": "at_least", "value": 8192 },
//!       "since": "3.0",
//!       "vendors": { "nvidia": { "kind": "at_least", "value": 32768 } }
//!     }
//!   }
//! }
//! ```

use crate::context::ApiVersion;
use crate::error::ReferenceError;
use crate::model::{is_canonical_name, CapabilityValue, FormatSupport};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Numeric threshold; integers compare exactly, anything involving a float
/// compares as `f64`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn is_finite(&self) -> bool {
        match self {
            Number::Int(_) => true,
            Number::Float(v) => v.is_finite(),
        }
    }

    fn as_f64(&self) -> f64 {
        match *self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    /// Numeric view of an observation, if it has one
    pub fn from_value(value: &CapabilityValue) -> Option<Number> {
        match value {
            CapabilityValue::Integer(v) => Some(Number::Int(*v)),
            CapabilityValue::Float(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => Some(a.cmp(b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(v) => write!(f, "{v}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

/// Exact value for `equals` expectations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Every component of an indexed query
    List(Vec<i64>),
}

impl Scalar {
    pub fn matches(&self, observed: &CapabilityValue) -> bool {
        match (self, observed) {
            (Scalar::Bool(a), CapabilityValue::Boolean(b)) => a == b,
            (Scalar::Int(a), CapabilityValue::Integer(b)) => a == b,
            (Scalar::Int(a), CapabilityValue::Float(b)) => (*a as f64) == *b,
            (Scalar::Float(a), CapabilityValue::Float(b)) => a == b,
            (Scalar::Float(a), CapabilityValue::Integer(b)) => *a == (*b as f64),
            (Scalar::Text(a), CapabilityValue::Text(b)) => a == b,
            (Scalar::List(a), CapabilityValue::List(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Text(v) => write!(f, "{v:?}"),
            Scalar::List(values) => write!(f, "{values:?}"),
        }
    }
}

/// Expected value or range of a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expectation {
    /// Any non-zero, non-false, non-empty observation
    Present,
    Equals { value: Scalar },
    AtLeast { value: Number },
    Range { min: Number, max: Number },
    /// Per-component minimums for indexed queries
    ListAtLeast { values: Vec<i64> },
    /// Usage flags the format must offer
    Format(FormatSupport),
}

impl Expectation {
    fn validate(&self) -> Result<(), String> {
        match self {
            Expectation::Present | Expectation::Equals { .. } | Expectation::Format(_) => Ok(()),
            Expectation::AtLeast { value } if !value.is_finite() => {
                Err("non-finite at_least threshold".to_string())
            }
            Expectation::AtLeast { .. } => Ok(()),
            Expectation::Range { min, max } => {
                if !min.is_finite() || !max.is_finite() {
                    Err("non-finite range bound".to_string())
                } else if min > max {
                    Err(format!("range min {min} exceeds max {max}"))
                } else {
                    Ok(())
                }
            }
            Expectation::ListAtLeast { values } if values.is_empty() => {
                Err("list_at_least needs at least one component".to_string())
            }
            Expectation::ListAtLeast { .. } => Ok(()),
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Expectation::Equals { value: Scalar::Float(v) } => v.is_finite(),
            Expectation::AtLeast { value } => value.is_finite(),
            Expectation::Range { min, max } => min.is_finite() && max.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Present => write!(f, "present"),
            Expectation::Equals { value } => write!(f, "== {value}"),
            Expectation::AtLeast { value } => write!(f, ">= {value}"),
            Expectation::Range { min, max } => write!(f, "{min}..={max}"),
            Expectation::ListAtLeast { values } => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, ">= [{}]", parts.join(", "))
            }
            Expectation::Format(support) => write!(f, "{support}"),
        }
    }
}

/// Catalog entry for one capability name
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub name: String,
    pub expected: Expectation,
    /// API version that introduced the capability
    pub since: Option<ApiVersion>,
    /// Overrides keyed by a lower-case vendor key
    pub vendors: BTreeMap<String, Expectation>,
}

impl ReferenceRecord {
    /// Vendor override whose key words appear as whole, consecutive words
    /// of the vendor string (case-insensitive, first key in order wins),
    /// otherwise the generic expectation.
    pub fn expectation_for(&self, vendor: &str) -> &Expectation {
        let vendor = words(vendor);
        self.vendors
            .iter()
            .find(|(key, _)| {
                let key = words(key);
                !key.is_empty() && vendor.windows(key.len()).any(|w| w == key.as_slice())
            })
            .map(|(_, expectation)| expectation)
            .unwrap_or(&self.expected)
    }
}

/// Lower-case alphanumeric words; `"NVIDIA Corporation"` -> `["nvidia", "corporation"]`
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Where the database document comes from (local file, download, ...)
pub trait ReferenceSource {
    /// Human name for logs and errors
    fn describe(&self) -> String;

    fn fetch(&mut self) -> std::io::Result<String>;
}

#[derive(Deserialize)]
struct RawDatabase {
    version: u32,
    capabilities: BTreeMap<String, RawRecord>,
}

#[derive(Deserialize)]
struct RawRecord {
    expected: Expectation,
    #[serde(default)]
    since: Option<ApiVersion>,
    #[serde(default)]
    vendors: BTreeMap<String, Expectation>,
}

/// Immutable name → record mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDatabase {
    version: u32,
    records: BTreeMap<String, ReferenceRecord>,
}

impl ReferenceDatabase {
    /// Fetch and parse. Source failures are `Unavailable`, bad documents `Malformed`.
    pub fn load(source: &mut impl ReferenceSource) -> Result<Self, ReferenceError> {
        let text = source.fetch().map_err(|e| ReferenceError::Unavailable {
            source_name: source.describe(),
            reason: e.to_string(),
        })?;
        let database = Self::from_json(&text)?;
        tracing::info!(
            source = %source.describe(),
            version = database.version,
            records = database.len(),
            "Loaded reference database"
        );
        Ok(database)
    }

    pub fn from_json(text: &str) -> Result<Self, ReferenceError> {
        let raw: RawDatabase =
            serde_json::from_str(text).map_err(|e| ReferenceError::Malformed(e.to_string()))?;

        let mut records = BTreeMap::new();
        for (name, record) in raw.capabilities {
            if !is_canonical_name(&name) {
                return Err(ReferenceError::Malformed(format!("invalid capability name {name:?}")));
            }
            record
                .expected
                .validate()
                .map_err(|e| ReferenceError::Malformed(format!("{name}: {e}")))?;

            let mut vendors = BTreeMap::new();
            for (key, expectation) in record.vendors {
                let key = key.trim().to_lowercase();
                if words(&key).is_empty() {
                    return Err(ReferenceError::Malformed(format!("{name}: empty vendor key {key:?}")));
                }
                expectation
                    .validate()
                    .map_err(|e| ReferenceError::Malformed(format!("{name} [{key}]: {e}")))?;
                vendors.insert(key, expectation);
            }

            records.insert(
                name.clone(),
                ReferenceRecord {
                    name,
                    expected: record.expected,
                    since: record.since,
                    vendors,
                },
            );
        }

        Ok(Self {
            version: raw.version,
            records,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceRecord> {
        self.records.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "version": 3,
        "capabilities": {
            "GL_MAX_TEXTURE_SIZE": {
                "expected": { "kind": "at_least", "value": 8192 },
                "since": "2.0",
                "vendors": { "NVIDIA": { "kind": "at_least", "value": 32768 } }
            },
            "GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT": {
                "expected": { "kind": "range", "min": 1.0, "max": 16.0 }
            },
            "GL_RGBA16F": {
                "expected": { "kind": "format", "sampled": true, "renderable": true }
            },
            "GL_SOME_FUTURE_LIMIT": {
                "expected": { "kind": "present" },
                "notes": "added by a newer database revision"
            }
        },
        "generated_by": "an unknown future tool"
    }"#;

    struct MissingSource;

    impl ReferenceSource for MissingSource {
        fn describe(&self) -> String {
            "missing.json".to_string()
        }

        fn fetch(&mut self) -> std::io::Result<String> {
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
        }
    }

    struct TextSource(&'static str);

    impl ReferenceSource for TextSource {
        fn describe(&self) -> String {
            "inline".to_string()
        }

        fn fetch(&mut self) -> std::io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_load_sample() {
        let db = ReferenceDatabase::load(&mut TextSource(SAMPLE)).unwrap();
        assert_eq!(db.version(), 3);
        assert_eq!(db.len(), 4);

        let record = db.get("GL_MAX_TEXTURE_SIZE").unwrap();
        assert_eq!(record.name, "GL_MAX_TEXTURE_SIZE");
        assert_eq!(record.since, Some(ApiVersion::new(2, 0)));
        assert_eq!(record.vendors.len(), 1);
        assert!(record.vendors.contains_key("nvidia"));

        let format = db.get("GL_RGBA16F").unwrap();
        assert_eq!(
            format.expected,
            Expectation::Format(FormatSupport {
                sampled: true,
                renderable: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_unknown_names_are_kept() {
        let db = ReferenceDatabase::from_json(SAMPLE).unwrap();
        assert!(db.get("GL_SOME_FUTURE_LIMIT").is_some());
    }

    #[test]
    fn test_vendor_override_selection() {
        let db = ReferenceDatabase::from_json(SAMPLE).unwrap();
        let record = db.get("GL_MAX_TEXTURE_SIZE").unwrap();
        assert_eq!(
            record.expectation_for("NVIDIA Corporation"),
            &Expectation::AtLeast { value: Number::Int(32768) }
        );
        assert_eq!(
            record.expectation_for("Intel"),
            &Expectation::AtLeast { value: Number::Int(8192) }
        );
    }

    #[test]
    fn test_vendor_key_must_match_whole_words() {
        let db = ReferenceDatabase::from_json(
            r#"{ "version": 1, "capabilities": { "GL_MAX_TEXTURE_SIZE": {
                "expected": { "kind": "at_least", "value": 8192 },
                "vendors": {
                    "ati": { "kind": "at_least", "value": 32768 },
                    "Imagination Technologies": { "kind": "at_least", "value": 4096 }
                }
            } } }"#,
        )
        .unwrap();
        let record = db.get("GL_MAX_TEXTURE_SIZE").unwrap();
        let generic = Expectation::AtLeast { value: Number::Int(8192) };
        // "ati" inside a longer word is not the ATI vendor
        assert_eq!(record.expectation_for("NVIDIA Corporation"), &generic);
        assert_eq!(
            record.expectation_for("Imagination Technologies"),
            &Expectation::AtLeast { value: Number::Int(4096) }
        );
        assert_eq!(
            record.expectation_for("ATI Technologies Inc."),
            &Expectation::AtLeast { value: Number::Int(32768) }
        );
        assert_eq!(record.expectation_for("Imagination"), &generic);
    }

    #[test]
    fn test_equals_lists() {
        let db = ReferenceDatabase::from_json(
            r#"{ "version": 1, "capabilities": { "GL_MAX_VIEWPORT_DIMS": {
                "expected": { "kind": "equals", "value": [16384, 16384] }
            } } }"#,
        )
        .unwrap();
        let Expectation::Equals { value } = &db.get("GL_MAX_VIEWPORT_DIMS").unwrap().expected else {
            panic!("expected an equals expectation");
        };
        assert!(value.matches(&CapabilityValue::List(vec![16384, 16384])));
        assert!(!value.matches(&CapabilityValue::List(vec![16384, 8192])));
        assert!(!value.matches(&CapabilityValue::Integer(16384)));
    }

    #[test]
    fn test_missing_source_is_unavailable() {
        let err = ReferenceDatabase::load(&mut MissingSource).unwrap_err();
        assert!(matches!(err, ReferenceError::Unavailable { .. }));
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            "not json",
            r#"{ "capabilities": {} }"#,
            r#"{ "version": 1 }"#,
            r#"{ "version": 1, "capabilities": { "bad name": { "expected": { "kind": "present" } } } }"#,
            r#"{ "version": 1, "capabilities": { "GL_X": { "expected": { "kind": "sometimes" } } } }"#,
            r#"{ "version": 1, "capabilities": { "GL_X": { "expected": { "kind": "range", "min": 4, "max": 2 } } } }"#,
            r#"{ "version": 1, "capabilities": { "GL_X": { "expected": { "kind": "list_at_least", "values": [] } } } }"#,
            r#"{ "version": 1, "capabilities": { "GL_X": { "expected": { "kind": "present" }, "vendors": { " ": { "kind": "present" } } } } }"#,
            r#"{ "version": 1, "capabilities": { "GL_X": { "expected": { "kind": "present" }, "vendors": { "--": { "kind": "present" } } } } }"#,
        ];
        for case in cases {
            let err = ReferenceDatabase::from_json(case).unwrap_err();
            assert!(matches!(err, ReferenceError::Malformed(_)), "accepted: {case}");
        }
    }

    #[test]
    fn test_number_ordering() {
        assert!(Number::Int(8192) >= Number::Int(8192));
        assert!(Number::Float(16.0) > Number::Int(8));
        assert!(Number::Int(1) < Number::Float(1.5));
    }
}
