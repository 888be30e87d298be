//! Session-wide resource attributes.
//!
//! The resource is rendered once, when the exporter is built, and the same
//! text is written into every row's resource column.

use serde_json::Value;

use crate::error::EncodeError;
use crate::field_encoder::compact_object;

pub const SERVICE_NAME: &str = "service.name";
pub const SERVICE_NAMESPACE: &str = "service.namespace";
pub const SERVICE_VERSION: &str = "service.version";

/// Ordered attributes describing the process producing the logs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    attributes: Vec<(String, Value)>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, name: &str, namespace: &str, version: &str) -> Self {
        self.with_attribute(SERVICE_NAME, name)
            .with_attribute(SERVICE_NAMESPACE, namespace)
            .with_attribute(SERVICE_VERSION, version)
    }

    /// Adds an attribute, replacing an earlier one with the same key.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
        self
    }

    pub fn attributes(&self) -> &[(String, Value)] {
        &self.attributes
    }

    /// Compact JSON object of all attributes.
    pub fn to_context_string(&self) -> Result<String, EncodeError> {
        compact_object(&self.attributes)
    }
}
