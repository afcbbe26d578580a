//! In-memory parameter store that records every write.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use super::{ParameterStore, ParameterType};
use crate::errors::{MigrationError, Result};

/// Recording [`ParameterStore`] with per-name failure injection.
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    parameters: Mutex<BTreeMap<String, (String, ParameterType)>>,
    attempts: Mutex<Vec<String>>,
    failing: BTreeSet<String>,
}

impl InMemoryParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject writes to `name` with a write error.
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Parameters written successfully, by name.
    pub fn parameters(&self) -> BTreeMap<String, (String, ParameterType)> {
        self.parameters.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Value of one written parameter.
    pub fn get(&self, name: &str) -> Option<String> {
        self.parameters.lock().ok()?.get(name).map(|(value, _)| value.clone())
    }

    /// Every attempted name, successful or not, in call order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn put_parameter(&self, name: &str, value: &str, kind: ParameterType) -> Result<()> {
        if let Ok(mut attempts) = self.attempts.lock() {
            attempts.push(name.to_string());
        }
        if self.failing.contains(name) {
            return Err(MigrationError::write(name, "injected write failure"));
        }
        let mut parameters = self
            .parameters
            .lock()
            .map_err(|_| MigrationError::write(name, "parameter store lock poisoned"))?;
        parameters.insert(name.to_string(), (value.to_string(), kind));
        Ok(())
    }
}
