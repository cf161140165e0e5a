//! JSON-RPC dispatch shared by the stdio and HTTP transports.

use std::sync::Arc;

use serde_json::Value;

use crate::error::ErrorKind;
use crate::invoker::{InvocationResult, ToolInvoker};
use crate::protocol::{
    text_content, JsonRpcRequest, JsonRpcResponse, ToolCall, ToolInfo, INTERNAL_ERROR, METHOD_NOT_FOUND,
};
use crate::registry::ToolRegistry;
use crate::service::Service;

#[derive(Clone)]
pub struct Dispatcher {
    service: Service,
    registry: Arc<ToolRegistry>,
    invoker: ToolInvoker,
}

impl Dispatcher {
    pub fn new(service: Service, registry: Arc<ToolRegistry>) -> Self {
        let invoker = ToolInvoker::new(registry.clone());
        Self {
            service,
            registry,
            invoker,
        }
    }

    pub fn service(&self) -> Service {
        self.service
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Discovery view of the registry, in registration order.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        self.registry
            .list()
            .iter()
            .map(|descriptor| ToolInfo::from_descriptor(self.service, descriptor))
            .collect()
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> InvocationResult {
        tracing::info!(service = %self.service, tool = %name, "Calling tool");
        let result = self.invoker.invoke(name, arguments).await;
        if let InvocationResult::Failure { kind, message } = &result {
            tracing::error!(tool = %name, ?kind, %message, "Tool call failed");
        }
        result
    }

    /// Handles `tools/list` and `tools/call`; anything else is an unknown method.
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id();
        match request.method.as_str() {
            "tools/list" => {
                let tools = serde_json::to_value(self.list_tools()).unwrap_or(Value::Null);
                JsonRpcResponse::success(id, serde_json::json!({ "tools": tools }))
            }
            "tools/call" => {
                let call: ToolCall = match request.params {
                    None | Some(Value::Null) => ToolCall::default(),
                    Some(params) => match serde_json::from_value(params) {
                        Ok(call) => call,
                        Err(e) => return JsonRpcResponse::internal_error(id, e),
                    },
                };
                let result = self.call_tool(&call.name, call.arguments).await;
                invocation_response(id, result)
            }
            method => JsonRpcResponse::method_not_found(id, method),
        }
    }

    /// Entry point for a raw request body. A body that is not a JSON-RPC
    /// request yields an internal error, echoing the `id` when it can be read.
    pub async fn handle_body(&self, body: &[u8]) -> JsonRpcResponse {
        let value: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(e) => return JsonRpcResponse::internal_error(Value::Null, e),
        };
        let id = value.get("id").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => JsonRpcResponse::internal_error(id, e),
        }
    }
}

/// Maps an invocation outcome onto the JSON-RPC envelope.
pub fn invocation_response(id: Value, result: InvocationResult) -> JsonRpcResponse {
    match result {
        InvocationResult::Success(payload) => JsonRpcResponse::success(id, text_content(&payload)),
        InvocationResult::Failure {
            kind: ErrorKind::ToolNotFound,
            message,
        } => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, message),
        InvocationResult::Failure { message, .. } => {
            JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("Tool execution error: {}", message))
        }
    }
}
