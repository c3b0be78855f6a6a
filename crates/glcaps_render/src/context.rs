//! Context negotiation
//!
//! Walks an ordered list of [`ContextConfiguration`] candidates, most
//! modern/strict first, and keeps the first one the driver accepts.

use crate::driver::{Driver, DriverContext};
use glcaps_core::{Api, ApiVersion, ContextConfiguration, ContextMetadata, Profile};
use std::fmt;
use thiserror::Error;

/// Yes/no hook asked once when only a degraded fallback is available
pub trait ConfirmFallback {
    fn confirm(&mut self, preferred: &ContextConfiguration, fallback: &ContextConfiguration) -> bool;
}

impl<F> ConfirmFallback for F
where
    F: FnMut(&ContextConfiguration, &ContextConfiguration) -> bool,
{
    fn confirm(&mut self, preferred: &ContextConfiguration, fallback: &ContextConfiguration) -> bool {
        self(preferred, fallback)
    }
}

/// One rejected candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub label: String,
    pub reason: String,
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.reason)
    }
}

fn describe_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "no candidates".to_string();
    }
    attempts
        .iter()
        .map(Attempt::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("no compatible context ({})", describe_attempts(.attempts))]
    NoCompatibleContext { attempts: Vec<Attempt> },
}

/// Exclusive handle to the negotiated context for one probing session.
///
/// Not `Clone`; the driver context is released when the handle drops.
pub struct ContextHandle<C: DriverContext> {
    context: C,
    metadata: ContextMetadata,
}

impl<C: DriverContext> std::fmt::Debug for ContextHandle<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

impl<C: DriverContext> ContextHandle<C> {
    pub fn configuration(&self) -> &ContextConfiguration {
        &self.metadata.configuration
    }

    pub fn metadata(&self) -> &ContextMetadata {
        &self.metadata
    }

    pub fn is_degraded(&self) -> bool {
        self.metadata.degraded
    }

    pub(crate) fn context(&self) -> &C {
        &self.context
    }

    /// End the session explicitly
    pub fn release(self) {
        drop(self);
    }
}

impl<C: DriverContext> Drop for ContextHandle<C> {
    fn drop(&mut self) {
        tracing::debug!(context = %self.metadata.configuration.label(), "Releasing context");
    }
}

/// The standard fallback ladder
pub fn default_candidates() -> Vec<ContextConfiguration> {
    let native = if cfg!(any(target_os = "macos", target_os = "ios")) {
        Api::Metal
    } else if cfg!(target_os = "windows") {
        Api::Dx12
    } else {
        Api::Vulkan
    };
    vec![
        ContextConfiguration::new(Api::Gl, 4, 6, Profile::ForwardCompatible),
        // What macOS hands out when asked for a core profile
        ContextConfiguration::new(Api::Gl, 3, 2, Profile::ForwardCompatible),
        ContextConfiguration::new(Api::GlEs, 3, 2, Profile::Core),
        ContextConfiguration::new(Api::GlEs, 3, 0, Profile::Core),
        ContextConfiguration::new(Api::Gl, 2, 1, Profile::Compatibility),
        ContextConfiguration::new(native, 1, 0, Profile::Core),
    ]
}

pub struct Negotiator {
    candidates: Vec<ContextConfiguration>,
}

impl Negotiator {
    pub fn new(candidates: Vec<ContextConfiguration>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[ContextConfiguration] {
        &self.candidates
    }

    /// Try each candidate in order and return the first accepted context.
    ///
    /// Contexts of rejected candidates are dropped before the next attempt.
    /// If the accepted candidate is not the preferred one, `confirm` is asked
    /// once; declining releases the context and ends negotiation.
    pub fn negotiate<D: Driver>(
        &self,
        driver: &mut D,
        confirm: &mut dyn ConfirmFallback,
    ) -> Result<ContextHandle<D::Context>, NegotiationError> {
        let mut attempts = Vec::new();

        for (index, config) in self.candidates.iter().enumerate() {
            let label = config.label();
            tracing::debug!(candidate = %label, "Trying context");

            let context = match driver.create_context(config) {
                Ok(context) => context,
                Err(e) => {
                    tracing::warn!(candidate = %label, error = %e, "Context candidate rejected");
                    attempts.push(Attempt {
                        label,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            let degraded = index > 0;
            if degraded && !confirm.confirm(&self.candidates[0], config) {
                tracing::info!(candidate = %label, "Fallback context declined");
                drop(context);
                attempts.push(Attempt {
                    label,
                    reason: "fallback declined".to_string(),
                });
                return Err(NegotiationError::NoCompatibleContext { attempts });
            }

            let version_string = context.version_string();
            let metadata = ContextMetadata {
                configuration: *config,
                version: ApiVersion::parse_loose(&version_string),
                version_string,
                degraded,
            };
            tracing::info!(
                context = %label,
                reported = %metadata.version_string,
                degraded,
                "Context negotiated"
            );
            return Ok(ContextHandle { context, metadata });
        }

        Err(NegotiationError::NoCompatibleContext { attempts })
    }
}

impl Default for Negotiator {
    fn default() -> Self {
        Self::new(default_candidates())
    }
}
