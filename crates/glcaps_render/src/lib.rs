//! glcaps Render
//!
//! Driver-facing half of the capability viewer: context negotiation with
//! fallbacks, the probe battery, and the wgpu-backed driver.

pub mod backend;
pub mod battery;
pub mod context;
pub mod driver;
pub mod probe;

#[cfg(test)]
mod mock;

pub use backend::{WgpuContext, WgpuDriver};
pub use battery::{ProbeDescriptor, Query, BATTERY};
pub use context::{default_candidates, Attempt, ConfirmFallback, ContextHandle, NegotiationError, Negotiator};
pub use driver::{Driver, DriverContext, DriverError, QueryError};
pub use probe::Prober;

pub use wgpu;
