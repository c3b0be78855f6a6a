//! Capability data model
//!
//! A [`CapabilitySet`] is the dense, normalized snapshot of everything the
//! prober read from one context. It is built once through
//! [`CapabilitySetBuilder`] and is read-only afterwards.

use crate::context::ContextMetadata;
use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Probe group a capability belongs to, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Context,
    Limits,
    ShaderStages,
    Compute,
    Extensions,
    TextureFormats,
    CompressedFormats,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Context,
        Category::Limits,
        Category::ShaderStages,
        Category::Compute,
        Category::Extensions,
        Category::TextureFormats,
        Category::CompressedFormats,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Context => "Context",
            Category::Limits => "Limits",
            Category::ShaderStages => "Shader stages",
            Category::Compute => "Compute",
            Category::Extensions => "Extensions",
            Category::TextureFormats => "Texture formats",
            Category::CompressedFormats => "Compressed formats",
        }
    }
}

/// Declared type of a capability, fixed by the probe that reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Integer,
    Integer64,
    Float,
    Boolean,
    Indexed,
    Format,
}

/// Usage flags a pixel/texture format supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatSupport {
    pub sampled: bool,
    pub filterable: bool,
    pub renderable: bool,
    pub blendable: bool,
    pub storage: bool,
}

impl FormatSupport {
    fn flags(&self) -> [bool; 5] {
        [
            self.sampled,
            self.filterable,
            self.renderable,
            self.blendable,
            self.storage,
        ]
    }

    pub fn is_empty(&self) -> bool {
        !self.flags().iter().any(|&f| f)
    }

    /// Every flag set in `other` is also set here
    pub fn contains(&self, other: &FormatSupport) -> bool {
        self.flags()
            .iter()
            .zip(other.flags())
            .all(|(&have, want)| have || !want)
    }

    /// At least one flag set in `other` is also set here
    pub fn intersects(&self, other: &FormatSupport) -> bool {
        self.flags()
            .iter()
            .zip(other.flags())
            .any(|(&have, want)| have && want)
    }
}

impl fmt::Display for FormatSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 5] = ["sampled", "filterable", "renderable", "blendable", "storage"];
        let set: Vec<&str> = NAMES
            .iter()
            .zip(self.flags())
            .filter(|(_, on)| *on)
            .map(|(name, _)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join("+"))
        }
    }
}

/// Observed value of a capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CapabilityValue {
    Text(String),
    /// 32- and 64-bit integer queries both land here; the entry's
    /// [`ValueKind`] records the width that was read.
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<i64>),
    Format(FormatSupport),
    /// The query failed, was unsupported, or was gated by a missing extension
    Unavailable(String),
}

impl CapabilityValue {
    /// False for the unavailable marker and for zero/false/empty observations
    pub fn is_present(&self) -> bool {
        match self {
            CapabilityValue::Text(s) => !s.is_empty(),
            CapabilityValue::Integer(v) => *v != 0,
            CapabilityValue::Float(v) => *v != 0.0,
            CapabilityValue::Boolean(b) => *b,
            CapabilityValue::List(values) => values.iter().any(|&v| v != 0),
            CapabilityValue::Format(support) => !support.is_empty(),
            CapabilityValue::Unavailable(_) => false,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, CapabilityValue::Unavailable(_))
    }

    /// Float values are finite; everything else trivially so
    pub fn is_finite(&self) -> bool {
        match self {
            CapabilityValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for CapabilityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityValue::Text(s) => write!(f, "{s}"),
            CapabilityValue::Integer(v) => write!(f, "{v}"),
            CapabilityValue::Float(v) => write!(f, "{v}"),
            CapabilityValue::Boolean(b) => write!(f, "{b}"),
            CapabilityValue::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            CapabilityValue::Format(support) => write!(f, "{support}"),
            CapabilityValue::Unavailable(reason) => write!(f, "unavailable ({reason})"),
        }
    }
}

/// `[A-Za-z][A-Za-z0-9_]*`, the naming scheme shared with the reference database
pub fn is_canonical_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// One named, typed capability observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEntry {
    pub name: String,
    pub category: Category,
    pub kind: ValueKind,
    pub value: CapabilityValue,
}

impl CapabilityEntry {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        kind: ValueKind,
        value: CapabilityValue,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            kind,
            value,
        }
    }

    pub fn unavailable(
        name: impl Into<String>,
        category: Category,
        kind: ValueKind,
        reason: impl Into<String>,
    ) -> Self {
        Self::new(name, category, kind, CapabilityValue::Unavailable(reason.into()))
    }
}

/// Who the driver says it is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor: String,
    pub renderer: String,
    pub driver_version: String,
    pub vendor_id: Option<u32>,
    pub device_id: Option<u32>,
    /// Backend that served the context (`Gl`, `Vulkan`, ...)
    pub backend: String,
}

/// Snapshot of one probing session
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilitySet {
    identity: DeviceIdentity,
    context: ContextMetadata,
    extensions: Vec<String>,
    entries: Vec<CapabilityEntry>,
}

impl CapabilitySet {
    pub fn builder(identity: DeviceIdentity, context: ContextMetadata) -> CapabilitySetBuilder {
        CapabilitySetBuilder {
            identity,
            context,
            extensions: Vec::new(),
            entries: Vec::new(),
            names: BTreeSet::new(),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn context(&self) -> &ContextMetadata {
        &self.context
    }

    /// Extension strings as enumerated from the driver, sorted
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.binary_search_by(|e| e.as_str().cmp(name)).is_ok()
    }

    /// Entries ordered by category, then by insertion order within a category
    pub fn entries(&self) -> &[CapabilityEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&CapabilityEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accumulates entries while enforcing name uniqueness and the naming scheme
pub struct CapabilitySetBuilder {
    identity: DeviceIdentity,
    context: ContextMetadata,
    extensions: Vec<String>,
    entries: Vec<CapabilityEntry>,
    names: BTreeSet<String>,
}

impl CapabilitySetBuilder {
    pub fn push(&mut self, entry: CapabilityEntry) -> Result<(), ModelError> {
        if !is_canonical_name(&entry.name) {
            return Err(ModelError::InvalidName(entry.name));
        }
        if !self.names.insert(entry.name.clone()) {
            return Err(ModelError::Duplicate(entry.name));
        }
        self.entries.push(entry);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn extensions(&mut self, extensions: impl IntoIterator<Item = String>) -> &mut Self {
        self.extensions.extend(extensions);
        self
    }

    pub fn build(mut self) -> CapabilitySet {
        // Stable: insertion order survives inside each category
        self.entries.sort_by_key(|e| e.category);
        self.extensions.sort();
        self.extensions.dedup();
        CapabilitySet {
            identity: self.identity,
            context: self.context,
            extensions: self.extensions,
            entries: self.entries,
        }
    }
}
