use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::ToolDescriptor;
use crate::service::Service;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";
/// Version announced in health, initialize and server info.
pub const SERVER_VERSION: &str = "1.0.0";

/// Method not found
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Internal error
pub const INTERNAL_ERROR: i32 = -32603;

/// Incoming JSON-RPC message. A message without an `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    pub fn id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn internal_error(id: Value, message: impl std::fmt::Display) -> Self {
        Self::failure(id, INTERNAL_ERROR, format!("Internal error: {}", message))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// One entry of a `tools/list` result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub read_only_hint: bool,
}

impl ToolInfo {
    pub fn from_descriptor(service: Service, descriptor: &ToolDescriptor) -> Self {
        let description = if descriptor.description.trim().is_empty() {
            format!("{} tool: {}", service, descriptor.name)
        } else {
            descriptor.description.clone()
        };
        Self {
            name: descriptor.name.clone(),
            description,
            input_schema: descriptor.input_schema(),
            annotations: ToolAnnotations {
                read_only_hint: descriptor.read_only,
            },
        }
    }
}

/// Fixed `initialize` result: protocol version, tools capability and server info.
pub fn initialize_result(service: Service) -> Value {
    serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": service.server_name(),
            "version": SERVER_VERSION
        }
    })
}

/// Text rendering of a tool payload: strings verbatim, everything else as
/// indented JSON.
pub fn payload_text(payload: &Value) -> String {
    match payload {
        Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

/// `tools/call` success envelope.
pub fn text_content(payload: &Value) -> Value {
    serde_json::json!({
        "content": [
            {
                "type": "text",
                "text": payload_text(payload)
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::permissive_schema;

    #[test]
    fn test_notification_has_no_id() {
        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(request.is_notification());
        assert_eq!(request.id(), Value::Null);

        let request: JsonRpcRequest =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":7,"method":"tools/list"}"#).unwrap();
        assert!(!request.is_notification());
        assert_eq!(request.id(), serde_json::json!(7));
    }

    #[test]
    fn test_failure_serialization_omits_result() {
        let response = JsonRpcResponse::method_not_found(serde_json::json!(1), "foo/bar");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 1,
                "error": {"code": -32601, "message": "Method not found: foo/bar"}
            })
        );
    }

    #[test]
    fn test_payload_text() {
        assert_eq!(payload_text(&Value::String("plain".into())), "plain");
        assert_eq!(
            payload_text(&serde_json::json!({"a": 1})),
            "{\n  \"a\": 1\n}"
        );
        assert_eq!(payload_text(&serde_json::json!(42)), "42");
    }

    #[test]
    fn test_tool_info_description_fallback_and_annotations() {
        let descriptor = ToolDescriptor::new("glue_get_table", "", permissive_schema());
        let info = ToolInfo::from_descriptor(Service::Glue, &descriptor);
        assert_eq!(info.description, "Glue tool: glue_get_table");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["annotations"]["readOnlyHint"], true);
        assert_eq!(json["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_initialize_result() {
        let result = initialize_result(Service::S3);
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "s3-mcp-server");
        assert!(result["capabilities"]["tools"].is_object());
    }
}
