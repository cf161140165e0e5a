//! Tool registry: the single catalog of tools a process exposes.
//!
//! Every service module registers its tools here once during startup. Both
//! transports enumerate and resolve tools exclusively through this type, so
//! discovery always reflects exactly what `tools/call` can reach.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{McpError, Result, ToolError};

const READONLY_OPS: [&str; 7] = ["get", "describe", "list", "search", "head", "read", "batch_get"];

const SERVICE_PREFIXES: [&str; 3] = ["athena_", "glue_", "s3_"];

/// An invocable operation behind a tool name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: Value) -> std::result::Result<Value, ToolError>;
}

/// Metadata announced for a tool through discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameter_schema: Value,
    pub read_only: bool,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameter_schema: Value) -> Self {
        let name = name.into();
        let read_only = is_read_only(&name);
        Self {
            name,
            description: description.into(),
            parameter_schema,
            read_only,
        }
    }

    /// The schema announced as `inputSchema`. A schema that is not a JSON
    /// object schema is replaced by an empty permissive one so that a single
    /// malformed tool never breaks discovery.
    pub fn input_schema(&self) -> Value {
        match &self.parameter_schema {
            Value::Object(map) if map.get("type").and_then(Value::as_str) == Some("object") => {
                self.parameter_schema.clone()
            }
            _ => permissive_schema(),
        }
    }
}

pub fn permissive_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

/// True when the operation part of a tool name only reads remote state.
pub fn is_read_only(tool_name: &str) -> bool {
    let operation = SERVICE_PREFIXES
        .iter()
        .find_map(|prefix| tool_name.strip_prefix(prefix))
        .unwrap_or(tool_name);
    READONLY_OPS.iter().any(|op| operation.starts_with(op))
}

#[derive(Clone)]
struct RegisteredTool {
    descriptor: Arc<ToolDescriptor>,
    handler: Arc<dyn ToolHandler>,
}

/// Insertion-ordered, append-only map from tool name to handler.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<IndexMap<String, RegisteredTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool. A name that is already taken is a programming error and
    /// is reported so startup can abort.
    pub fn register(&self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) -> Result<()> {
        let mut tools = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        if tools.contains_key(&descriptor.name) {
            return Err(McpError::DuplicateTool(descriptor.name));
        }
        tracing::debug!(tool = %descriptor.name, "Registered tool");
        tools.insert(
            descriptor.name.clone(),
            RegisteredTool {
                descriptor: Arc::new(descriptor),
                handler,
            },
        );
        Ok(())
    }

    /// Registers an async function taking a shared context and a typed
    /// parameter struct. The parameter schema is derived from `P`, and the
    /// argument bag is deserialized into `P` before every call.
    pub fn register_tool<C, P, F, Fut>(&self, name: &str, description: &str, context: C, operation: F) -> Result<()>
    where
        C: Clone + Send + Sync + 'static,
        P: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(C, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, ToolError>> + Send + 'static,
    {
        let schema = serde_json::to_value(schemars::schema_for!(P)).unwrap_or(Value::Null);
        let handler = TypedTool {
            name: name.to_string(),
            context,
            operation,
            _params: PhantomData,
        };
        self.register(ToolDescriptor::new(name, description, schema), Arc::new(handler))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> Vec<Arc<ToolDescriptor>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.values().map(|t| t.descriptor.clone()).collect()
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn ToolHandler>> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.get(name).map(|t| t.handler.clone())
    }

    pub fn names(&self) -> Vec<String> {
        let tools = self.tools.read().unwrap_or_else(PoisonError::into_inner);
        tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct TypedTool<C, P, F> {
    name: String,
    context: C,
    operation: F,
    _params: PhantomData<fn() -> P>,
}

#[async_trait]
impl<C, P, F, Fut> ToolHandler for TypedTool<C, P, F>
where
    C: Clone + Send + Sync + 'static,
    P: DeserializeOwned + Send + 'static,
    F: Fn(C, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Value, ToolError>> + Send + 'static,
{
    async fn call(&self, arguments: Value) -> std::result::Result<Value, ToolError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };
        let params: P = serde_json::from_value(arguments)
            .map_err(|e| ToolError::Validation(format!("Invalid arguments for {}: {}", self.name, e)))?;
        (self.operation)(self.context.clone(), params).await
    }
}
