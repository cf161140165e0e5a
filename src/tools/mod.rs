//! Per-service tool sets.
//!
//! Each module registers typed operations on a [`ToolRegistry`]. Operations
//! receive the shared [`ClientHandle`], build an AWS request from their
//! parameter struct and translate remote failures into one message.

pub mod athena;
pub mod datazone;
pub mod glue;
pub mod s3;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::aws::{ClientHandle, ServiceError};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::service::Service;

/// Registers every tool of `service`.
pub fn register(service: Service, registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    match service {
        Service::DataZone => datazone::register(registry, client),
        Service::Glue => glue::register(registry, client),
        Service::Athena => athena::register(registry, client),
        Service::S3 => s3::register(registry, client),
    }
}

/// Builder for an AWS request body. Optional members are only sent when they
/// carry a value: `None`, empty strings and empty collections are skipped.
#[derive(Debug, Default)]
pub(crate) struct Input(Map<String, Value>);

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Serialize) -> Self {
        self.0
            .insert(key.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        self
    }

    pub fn opt<T: Serialize>(self, key: &str, value: Option<T>) -> Self {
        match value.and_then(|v| serde_json::to_value(v).ok()) {
            Some(value) if !is_blank(&value) => self.set(key, value),
            _ => self,
        }
    }

    /// Sends `key: true` only when set.
    pub fn flag(self, key: &str, value: bool) -> Self {
        if value {
            self.set(key, true)
        } else {
            self
        }
    }

    pub fn build(self) -> Value {
        Value::Object(self.0)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Logs a failed remote call and wraps it under `message`.
pub(crate) fn remote_failure(operation: &str, error: &ServiceError, message: String) -> ToolError {
    tracing::error!(
        operation,
        code = error.code().unwrap_or("none"),
        error = %error,
        "{}",
        message
    );
    ToolError::remote(error, message)
}
