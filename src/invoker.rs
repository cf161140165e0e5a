use std::any::Any;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ErrorKind;
use crate::registry::ToolRegistry;

/// Normalized outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Success(Value),
    Failure { kind: ErrorKind, message: String },
}

impl InvocationResult {
    pub fn failure(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Resolves tools by name and runs them, turning every outcome (including
/// panics) into an [`InvocationResult`].
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }

    pub async fn invoke(&self, name: &str, arguments: Value) -> InvocationResult {
        let Some(handler) = self.registry.resolve(name) else {
            return InvocationResult::failure(ErrorKind::ToolNotFound, format!("Tool not found: {}", name));
        };

        // The operation runs on its own task so a panic stays contained.
        let task = tokio::spawn(async move { handler.call(arguments).await });

        match task.await {
            Ok(Ok(payload)) => InvocationResult::Success(payload),
            Ok(Err(e)) => InvocationResult::failure(e.kind(), e.to_string()),
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic().as_ref());
                tracing::error!(tool = %name, %message, "Tool panicked");
                InvocationResult::failure(ErrorKind::Internal, message)
            }
            Err(e) => InvocationResult::failure(ErrorKind::Internal, e.to_string()),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio_test::assert_ok;

    use super::*;
    use crate::error::ToolError;
    use crate::registry::{permissive_schema, ToolDescriptor, ToolHandler};

    struct Fixed(Result<Value, ToolError>);

    #[async_trait]
    impl ToolHandler for Fixed {
        async fn call(&self, _arguments: Value) -> Result<Value, ToolError> {
            self.0.clone()
        }
    }

    struct Panics;

    #[async_trait]
    impl ToolHandler for Panics {
        async fn call(&self, _arguments: Value) -> Result<Value, ToolError> {
            panic!("bucket index out of range")
        }
    }

    fn tool(handler: impl ToolHandler + 'static) -> Arc<dyn ToolHandler> {
        Arc::new(handler)
    }

    fn invoker(tools: Vec<(&str, Arc<dyn ToolHandler>)>) -> ToolInvoker {
        let registry = ToolRegistry::new();
        for (name, handler) in tools {
            assert_ok!(registry.register(ToolDescriptor::new(name, "", permissive_schema()), handler));
        }
        ToolInvoker::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let result = invoker(vec![]).invoke("nonexistent", Value::Null).await;
        assert_eq!(
            result,
            InvocationResult::failure(ErrorKind::ToolNotFound, "Tool not found: nonexistent")
        );
    }

    #[tokio::test]
    async fn test_success_and_declared_failure() {
        let invoker = invoker(vec![
            ("ok", tool(Fixed(Ok(serde_json::json!({"n": 1}))))),
            ("bad", tool(Fixed(Err(ToolError::Validation("status must be ENABLED".into()))))),
        ]);

        let ok = invoker.invoke("ok", Value::Null).await;
        assert!(ok.is_success());

        let bad = invoker.invoke("bad", Value::Null).await;
        assert_eq!(
            bad,
            InvocationResult::failure(ErrorKind::Validation, "status must be ENABLED")
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_internal_failure() {
        let invoker = invoker(vec![("boom", tool(Panics))]);
        let result = invoker.invoke("boom", Value::Null).await;
        assert_eq!(
            result,
            InvocationResult::failure(ErrorKind::Internal, "bucket index out of range")
        );

        // The invoker keeps working after a panic.
        let again = invoker.invoke("missing", Value::Null).await;
        assert!(matches!(again, InvocationResult::Failure { kind: ErrorKind::ToolNotFound, .. }));
    }
}
