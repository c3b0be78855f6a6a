//! Capability prober
//!
//! Runs the probe battery against a negotiated context. Groups run
//! independently and every failing query is caught at the query boundary and
//! recorded as an unavailable entry, so the resulting set stays dense.

use crate::battery::{ProbeDescriptor, Query, BATTERY};
use crate::context::ContextHandle;
use crate::driver::{DriverContext, QueryError};
use glcaps_core::{
    CapabilityEntry, CapabilitySet, CapabilitySetBuilder, CapabilityValue, Category, ValueKind,
};
use glcaps_core::model::is_canonical_name;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

impl Query {
    /// Issue the query with its declared width and decode the result
    pub fn read<C: DriverContext>(&self, context: &C, name: &str) -> Result<CapabilityValue, QueryError> {
        let value = match *self {
            Query::String => CapabilityValue::Text(context.get_string(name)?),
            Query::Integer => CapabilityValue::Integer(i64::from(context.get_integer(name)?)),
            Query::Integer64 => CapabilityValue::Integer(context.get_integer64(name)?),
            Query::Float => {
                let value = context.get_float(name)?;
                if !value.is_finite() {
                    return Err(QueryError::NonFinite);
                }
                CapabilityValue::Float(f64::from(value))
            }
            Query::Boolean => CapabilityValue::Boolean(context.get_boolean(name)?),
            Query::Indexed { count } => CapabilityValue::List(
                (0..count)
                    .map(|index| context.get_integer_indexed(name, index).map(i64::from))
                    .collect::<Result<_, _>>()?,
            ),
            Query::Format => CapabilityValue::Format(context.format_support(name)?),
        };
        Ok(value)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Probe one descriptor. Never fails: errors and driver panics become
/// [`CapabilityValue::Unavailable`].
pub fn probe_descriptor<C: DriverContext>(
    context: &C,
    descriptor: &ProbeDescriptor,
    extensions: &BTreeSet<String>,
) -> CapabilityEntry {
    let kind = descriptor.query.kind();
    if let Some(extension) = descriptor.requires {
        if !extensions.contains(extension) {
            return CapabilityEntry::unavailable(
                descriptor.name,
                descriptor.category,
                kind,
                format!("requires {extension}"),
            );
        }
    }

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| descriptor.query.read(context, descriptor.name)));
    let value = match outcome {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            tracing::debug!(capability = descriptor.name, error = %e, "Capability unavailable");
            CapabilityValue::Unavailable(e.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(capability = descriptor.name, %message, "Driver panicked during query");
            CapabilityValue::Unavailable(format!("driver panic: {message}"))
        }
    };
    CapabilityEntry::new(descriptor.name, descriptor.category, kind, value)
}

pub struct Prober<'a> {
    battery: &'a [ProbeDescriptor],
}

impl Prober<'static> {
    pub fn new() -> Self {
        Self { battery: BATTERY }
    }
}

impl Default for Prober<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Prober<'a> {
    pub fn with_battery(battery: &'a [ProbeDescriptor]) -> Self {
        Self { battery }
    }

    /// Read every capability from the context into a new set
    pub fn probe<C: DriverContext>(&self, handle: &ContextHandle<C>) -> CapabilitySet {
        let context = handle.context();
        let identity = context.identity();
        tracing::info!(
            vendor = %identity.vendor,
            renderer = %identity.renderer,
            context = %handle.configuration().label(),
            "Probing capabilities"
        );

        let extensions = enumerate_extensions(context);
        let mut builder = CapabilitySet::builder(identity, handle.metadata().clone());
        builder.extensions(extensions.iter().cloned());

        for category in Category::ALL {
            if category == Category::Extensions {
                self.record_extensions(&mut builder, &extensions);
                continue;
            }
            let group: Vec<&ProbeDescriptor> =
                self.battery.iter().filter(|d| d.category == category).collect();
            if group.is_empty() {
                continue;
            }

            let mut unavailable = 0;
            for descriptor in &group {
                let entry = probe_descriptor(context, descriptor, &extensions);
                if entry.value.is_unavailable() {
                    unavailable += 1;
                }
                push(&mut builder, entry);
            }
            if unavailable == group.len() {
                tracing::warn!(group = category.label(), "Every query in group unavailable");
            } else {
                tracing::debug!(
                    group = category.label(),
                    probed = group.len(),
                    unavailable,
                    "Probe group finished"
                );
            }
        }

        let set = builder.build();
        tracing::info!(capabilities = set.len(), extensions = set.extensions().len(), "Probing finished");
        set
    }

    /// Advertised extensions as `true`, gating extensions the driver lacks as `false`
    fn record_extensions(&self, builder: &mut CapabilitySetBuilder, extensions: &BTreeSet<String>) {
        for extension in extensions {
            push(
                builder,
                CapabilityEntry::new(
                    extension.as_str(),
                    Category::Extensions,
                    ValueKind::Boolean,
                    CapabilityValue::Boolean(true),
                ),
            );
        }
        let gating: BTreeSet<&str> = self.battery.iter().filter_map(|d| d.requires).collect();
        for extension in gating {
            if !extensions.contains(extension) && !builder.contains(extension) {
                push(
                    builder,
                    CapabilityEntry::new(
                        extension,
                        Category::Extensions,
                        ValueKind::Boolean,
                        CapabilityValue::Boolean(false),
                    ),
                );
            }
        }
    }
}

fn enumerate_extensions<C: DriverContext>(context: &C) -> BTreeSet<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| context.extensions())) {
        Ok(Ok(list)) => list
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| {
                let valid = is_canonical_name(e);
                if !valid {
                    tracing::warn!(extension = %e, "Skipping malformed extension name");
                }
                valid
            })
            .collect(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Extension enumeration failed, gated queries skipped");
            BTreeSet::new()
        }
        Err(payload) => {
            tracing::warn!(message = %panic_message(payload.as_ref()), "Driver panicked enumerating extensions");
            BTreeSet::new()
        }
    }
}

fn push(builder: &mut CapabilitySetBuilder, entry: CapabilityEntry) {
    if let Err(e) = builder.push(entry) {
        tracing::warn!(error = %e, "Dropping capability entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::{ARB_COMPUTE_SHADER, EXT_ANISOTROPIC};
    use crate::context::{ConfirmFallback, Negotiator};
    use crate::mock::{MockDriver, MockValues};
    use glcaps_core::{Api, ContextConfiguration, FormatSupport, Profile};

    fn config() -> ContextConfiguration {
        ContextConfiguration::new(Api::Gl, 4, 6, Profile::Core)
    }

    fn values() -> MockValues {
        let mut values = MockValues::default();
        values.extensions = vec![EXT_ANISOTROPIC.to_string(), "GL_KHR_debug".to_string()];
        values.strings.insert("GL_VENDOR".into(), "Mock Vendor".into());
        values.strings.insert("GL_VERSION".into(), "4.6.0 Mock".into());
        values.integers.insert("GL_MAX_TEXTURE_SIZE".into(), 16384);
        values.integers64.insert("GL_MAX_ELEMENT_INDEX".into(), 4_294_967_295);
        values.floats.insert("GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT".into(), 16.0);
        values.floats.insert("GL_MAX_TEXTURE_LOD_BIAS".into(), f32::NAN);
        values.booleans.insert("GL_SHADER_COMPILER".into(), true);
        values.indexed.insert("GL_MAX_VIEWPORT_DIMS".into(), vec![32768, 32768]);
        values.indexed.insert("GL_MAX_COMPUTE_WORK_GROUP_SIZE".into(), vec![1024, 1024, 64]);
        values.formats.insert(
            "GL_RGBA8".into(),
            FormatSupport { sampled: true, filterable: true, renderable: true, blendable: true, storage: false },
        );
        values.panicking.push("GL_MAX_SAMPLES".into());
        values
    }

    fn probe(values: MockValues) -> (MockDriver, CapabilitySet) {
        let mut driver = MockDriver::with_values(&[config()], values);
        let mut confirm = |_: &ContextConfiguration, _: &ContextConfiguration| true;
        let confirm: &mut dyn ConfirmFallback = &mut confirm;
        let handle = Negotiator::new(vec![config()]).negotiate(&mut driver, confirm).unwrap();
        let set = Prober::new().probe(&handle);
        handle.release();
        (driver, set)
    }

    #[test]
    fn test_every_descriptor_is_recorded() {
        let (_, set) = probe(values());
        for descriptor in BATTERY {
            let entry = set.get(descriptor.name).unwrap_or_else(|| panic!("missing {}", descriptor.name));
            assert_eq!(entry.kind, descriptor.query.kind());
        }
    }

    #[test]
    fn test_widths_are_preserved() {
        let (_, set) = probe(values());
        assert_eq!(set.get("GL_MAX_TEXTURE_SIZE").unwrap().value, CapabilityValue::Integer(16384));
        let element_index = set.get("GL_MAX_ELEMENT_INDEX").unwrap();
        assert_eq!(element_index.kind, ValueKind::Integer64);
        assert_eq!(element_index.value, CapabilityValue::Integer(4_294_967_295));
        assert_eq!(
            set.get("GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT").unwrap().value,
            CapabilityValue::Float(16.0)
        );
        assert_eq!(
            set.get("GL_MAX_VIEWPORT_DIMS").unwrap().value,
            CapabilityValue::List(vec![32768, 32768])
        );
        assert_eq!(set.get("GL_SHADER_COMPILER").unwrap().value, CapabilityValue::Boolean(true));
    }

    #[test]
    fn test_missing_extension_skips_gated_queries() {
        let (driver, set) = probe(values());
        let queried = driver.queried();
        // GL_ARB_compute_shader is absent: nothing gated by it may reach the driver
        for descriptor in BATTERY.iter().filter(|d| d.requires == Some(ARB_COMPUTE_SHADER)) {
            assert!(!queried.iter().any(|q| q == descriptor.name), "queried {}", descriptor.name);
            assert_eq!(
                set.get(descriptor.name).unwrap().value,
                CapabilityValue::Unavailable(format!("requires {ARB_COMPUTE_SHADER}"))
            );
        }
        assert_eq!(set.get(ARB_COMPUTE_SHADER).unwrap().value, CapabilityValue::Boolean(false));
        assert!(queried.iter().any(|q| q == "GL_MAX_TEXTURE_MAX_ANISOTROPY_EXT"));
    }

    #[test]
    fn test_extensions_recorded_as_entries() {
        let (_, set) = probe(values());
        assert_eq!(set.get("GL_KHR_debug").unwrap().value, CapabilityValue::Boolean(true));
        assert_eq!(set.get("GL_KHR_debug").unwrap().category, Category::Extensions);
        assert!(set.has_extension(EXT_ANISOTROPIC));
    }

    #[test]
    fn test_failures_are_contained() {
        let (_, set) = probe(values());
        assert!(matches!(
            set.get("GL_MAX_SAMPLES").unwrap().value,
            CapabilityValue::Unavailable(ref reason) if reason.starts_with("driver panic")
        ));
        assert_eq!(
            set.get("GL_MAX_TEXTURE_LOD_BIAS").unwrap().value,
            CapabilityValue::Unavailable(QueryError::NonFinite.to_string())
        );
        assert_eq!(
            set.get("GL_MAX_3D_TEXTURE_SIZE").unwrap().value,
            CapabilityValue::Unavailable(QueryError::InvalidEnum.to_string())
        );
        // Later groups still ran
        assert!(set.get("GL_RGBA8").unwrap().value.is_present());
    }

    #[test]
    fn test_empty_driver_still_yields_dense_set() {
        let (_, set) = probe(MockValues::default());
        assert!(set.len() >= BATTERY.len());
        assert!(set
            .entries()
            .iter()
            .filter(|e| e.category != Category::Extensions)
            .all(|e| e.value.is_unavailable()));
    }
}
