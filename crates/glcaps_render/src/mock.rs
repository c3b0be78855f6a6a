//! Scriptable in-memory driver for headless tests

use crate::driver::{Driver, DriverContext, DriverError, QueryError};
use glcaps_core::{Api, ContextConfiguration, DeviceIdentity, FormatSupport};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Default)]
pub struct MockValues {
    pub extensions: Vec<String>,
    pub strings: HashMap<String, String>,
    pub integers: HashMap<String, i32>,
    pub integers64: HashMap<String, i64>,
    pub floats: HashMap<String, f32>,
    pub booleans: HashMap<String, bool>,
    pub indexed: HashMap<String, Vec<i32>>,
    pub formats: HashMap<String, FormatSupport>,
    /// Queries that panic inside the driver
    pub panicking: Vec<String>,
}

#[derive(Default)]
struct Counters {
    attempts: Cell<usize>,
    live: Cell<usize>,
    peak: Cell<usize>,
    queried: RefCell<Vec<String>>,
}

pub struct MockDriver {
    accepted: Vec<ContextConfiguration>,
    values: Rc<MockValues>,
    counters: Rc<Counters>,
}

impl MockDriver {
    pub fn accepting(accepted: &[ContextConfiguration]) -> Self {
        Self::with_values(accepted, MockValues::default())
    }

    pub fn with_values(accepted: &[ContextConfiguration], values: MockValues) -> Self {
        Self {
            accepted: accepted.to_vec(),
            values: Rc::new(values),
            counters: Rc::new(Counters::default()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.counters.attempts.get()
    }

    pub fn live_contexts(&self) -> usize {
        self.counters.live.get()
    }

    pub fn peak_live_contexts(&self) -> usize {
        self.counters.peak.get()
    }

    /// Names passed to any query method, in call order
    pub fn queried(&self) -> Vec<String> {
        self.counters.queried.borrow().clone()
    }
}

impl Driver for MockDriver {
    type Context = MockContext;

    fn create_context(&mut self, config: &ContextConfiguration) -> Result<MockContext, DriverError> {
        let counters = &self.counters;
        counters.attempts.set(counters.attempts.get() + 1);
        if !self.accepted.contains(config) {
            return Err(DriverError::ApiUnavailable(config.label()));
        }
        counters.live.set(counters.live.get() + 1);
        counters.peak.set(counters.peak.get().max(counters.live.get()));
        Ok(MockContext {
            config: *config,
            values: Rc::clone(&self.values),
            counters: Rc::clone(&self.counters),
        })
    }
}

pub struct MockContext {
    config: ContextConfiguration,
    values: Rc<MockValues>,
    counters: Rc<Counters>,
}

impl MockContext {
    fn record(&self, name: &str) {
        self.counters.queried.borrow_mut().push(name.to_string());
        if self.values.panicking.iter().any(|n| n == name) {
            panic!("driver crashed reading {name}");
        }
    }

    fn lookup<T: Clone>(&self, map: &HashMap<String, T>, name: &str) -> Result<T, QueryError> {
        self.record(name);
        map.get(name).cloned().ok_or(QueryError::InvalidEnum)
    }
}

impl Drop for MockContext {
    fn drop(&mut self) {
        self.counters.live.set(self.counters.live.get() - 1);
    }
}

impl DriverContext for MockContext {
    fn identity(&self) -> DeviceIdentity {
        DeviceIdentity {
            vendor: "Mock Vendor".to_string(),
            renderer: "Mock Renderer".to_string(),
            driver_version: "1.0".to_string(),
            vendor_id: Some(0xFFFF),
            device_id: Some(1),
            backend: "Gl".to_string(),
        }
    }

    fn version_string(&self) -> String {
        let version = self.config.version;
        match self.config.api {
            Api::GlEs => format!("OpenGL ES {version} Mock"),
            _ => format!("{version}.0 Mock"),
        }
    }

    fn extensions(&self) -> Result<Vec<String>, QueryError> {
        Ok(self.values.extensions.clone())
    }

    fn get_string(&self, name: &str) -> Result<String, QueryError> {
        self.lookup(&self.values.strings, name)
    }

    fn get_integer(&self, name: &str) -> Result<i32, QueryError> {
        self.lookup(&self.values.integers, name)
    }

    fn get_integer64(&self, name: &str) -> Result<i64, QueryError> {
        self.lookup(&self.values.integers64, name)
    }

    fn get_float(&self, name: &str) -> Result<f32, QueryError> {
        self.lookup(&self.values.floats, name)
    }

    fn get_boolean(&self, name: &str) -> Result<bool, QueryError> {
        self.lookup(&self.values.booleans, name)
    }

    fn get_integer_indexed(&self, name: &str, index: u32) -> Result<i32, QueryError> {
        let values = self.lookup(&self.values.indexed, name)?;
        values
            .get(index as usize)
            .copied()
            .ok_or(QueryError::InvalidIndex(index))
    }

    fn format_support(&self, format: &str) -> Result<FormatSupport, QueryError> {
        self.lookup(&self.values.formats, format)
    }
}
