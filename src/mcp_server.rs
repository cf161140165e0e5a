use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::protocol::{initialize_result, JsonRpcRequest, JsonRpcResponse};

/// MCP server speaking newline-delimited JSON-RPC over stdin/stdout.
pub struct StdioServer {
    dispatcher: Dispatcher,
}

impl StdioServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub async fn run(&self) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serves until `input` reaches end of file.
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(input).lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let response_str = serde_json::to_string(&response)?;
                output.write_all(response_str.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    /// Returns `None` for notifications and for responses sent by the client.
    pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => return Some(JsonRpcResponse::internal_error(Value::Null, e)),
        };

        // We don't send requests, so responses are dropped.
        if value.get("method").is_none() && (value.get("result").is_some() || value.get("error").is_some()) {
            return None;
        }

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(e) => return Some(JsonRpcResponse::internal_error(id, e)),
        };

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }
        Some(self.handle_request(request).await)
    }

    async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        match request.method.as_str() {
            "initialize" => JsonRpcResponse::success(request.id(), initialize_result(self.dispatcher.service())),
            "ping" => JsonRpcResponse::success(request.id(), serde_json::json!({})),
            _ => self.dispatcher.dispatch(request).await,
        }
    }

    fn handle_notification(&self, notification: &JsonRpcRequest) {
        match notification.method.as_str() {
            "notifications/initialized" => tracing::debug!("Client initialized"),
            other => tracing::debug!(method = %other, "Ignoring notification"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::ToolError;
    use crate::registry::ToolRegistry;
    use crate::service::Service;

    #[derive(Deserialize, schemars::JsonSchema)]
    struct Empty {}

    async fn list_things(_: (), _: Empty) -> std::result::Result<Value, ToolError> {
        Ok(json!({"things": [1, 2]}))
    }

    fn server() -> StdioServer {
        let registry = ToolRegistry::new();
        registry.register_tool("list_things", "List things", (), list_things).unwrap();
        StdioServer::new(Dispatcher::new(Service::Athena, Arc::new(registry)))
    }

    fn parse_lines(output: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(output)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_session_over_stdio() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"list_things","arguments":{}}}"#,
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#,
        ]
        .join("\n");
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let responses = parse_lines(&output);
        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "athena-mcp-server");
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "list_things");
        assert_eq!(
            responses[2]["result"]["content"][0]["text"],
            "{\n  \"things\": [\n    1,\n    2\n  ]\n}"
        );
        assert_eq!(responses[3], json!({"jsonrpc": "2.0", "id": 4, "result": {}}));
    }

    #[tokio::test]
    async fn test_bad_lines_do_not_stop_the_server() {
        let input = "garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"resources/list\"}\n";
        let mut output = Vec::new();

        server().serve(input.as_bytes(), &mut output).await.unwrap();

        let responses = parse_lines(&output);
        assert_eq!(responses[0]["error"]["code"], -32603);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[1]["error"]["message"], "Method not found: resources/list");
    }

    #[tokio::test]
    async fn test_client_responses_are_ignored() {
        let response = server()
            .handle_line(r#"{"jsonrpc":"2.0","id":10,"result":{}}"#)
            .await;
        assert!(response.is_none());
    }
}
