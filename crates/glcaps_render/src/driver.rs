//! Driver seam
//!
//! Everything the negotiator and prober need from a graphics driver. Query
//! methods take `&self`: probing never changes pipeline or render state.

use glcaps_core::{ContextConfiguration, DeviceIdentity, FormatSupport};
use thiserror::Error;

/// Context creation failure for one candidate
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DriverError {
    #[error("{0} is not available on this machine")]
    ApiUnavailable(String),

    #[error("requested version {requested} but the driver provides {provided}")]
    VersionUnavailable { requested: String, provided: String },

    #[error("context creation failed: {0}")]
    Creation(String),
}

/// A single capability query failure; recorded, never fatal
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("not supported by this driver")]
    Unsupported,

    #[error("invalid enum")]
    InvalidEnum,

    #[error("index {0} out of range")]
    InvalidIndex(u32),

    #[error("value {value} does not fit the declared width")]
    OutOfRange { value: String },

    #[error("non-finite value")]
    NonFinite,

    #[error("driver error: {0}")]
    Driver(String),
}

/// Creates contexts; one driver may hand out many over its lifetime
pub trait Driver {
    type Context: DriverContext;

    fn create_context(&mut self, config: &ContextConfiguration) -> Result<Self::Context, DriverError>;
}

/// A live driver context. Dropping it releases its driver resources.
pub trait DriverContext {
    fn identity(&self) -> DeviceIdentity;

    /// Version string as the driver reports it
    fn version_string(&self) -> String;

    fn extensions(&self) -> Result<Vec<String>, QueryError>;

    fn get_string(&self, name: &str) -> Result<String, QueryError>;

    fn get_integer(&self, name: &str) -> Result<i32, QueryError>;

    fn get_integer64(&self, name: &str) -> Result<i64, QueryError>;

    fn get_float(&self, name: &str) -> Result<f32, QueryError>;

    fn get_boolean(&self, name: &str) -> Result<bool, QueryError>;

    fn get_integer_indexed(&self, name: &str, index: u32) -> Result<i32, QueryError>;

    fn format_support(&self, format: &str) -> Result<FormatSupport, QueryError>;
}
