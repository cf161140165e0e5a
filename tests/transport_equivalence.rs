//! The stdio and HTTP transports answer the same requests identically.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceExt;

use aws_data_mcp::http::router;
use aws_data_mcp::{Dispatcher, Service, StdioServer, ToolError, ToolRegistry};

#[derive(Deserialize, JsonSchema)]
struct LookupParams {
    /// Bucket to look up
    bucket_name: String,
}

async fn lookup(_: (), params: LookupParams) -> Result<Value, ToolError> {
    match params.bucket_name.as_str() {
        "missing" => Err(ToolError::RemoteService {
            code: Some("NoSuchBucket".to_string()),
            message: "Bucket missing does not exist".to_string(),
        }),
        name => Ok(json!({"bucket": name, "objects": []})),
    }
}

fn dispatcher() -> Dispatcher {
    let registry = ToolRegistry::new();
    registry
        .register_tool("s3_lookup", "Looks up a bucket", (), lookup)
        .unwrap();
    Dispatcher::new(Service::S3, Arc::new(registry))
}

async fn over_stdio(dispatcher: &Dispatcher, body: &str) -> Value {
    let response = StdioServer::new(dispatcher.clone())
        .handle_line(body)
        .await
        .expect("request expects a response");
    serde_json::to_value(response).unwrap()
}

async fn over_http(dispatcher: &Dispatcher, body: &str) -> Value {
    let request = Request::builder()
        .method("POST")
        .uri("/mcp/s3")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(dispatcher.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_same_request_same_response() {
    let dispatcher = dispatcher();
    let requests = [
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"s3_lookup","arguments":{"bucket_name":"lake"}}}"#,
        r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"s3_lookup","arguments":{"bucket_name":"missing"}}}"#,
        r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"s3_lookup","arguments":{}}}"#,
        r#"{"jsonrpc":"2.0","id":"five","method":"tools/call","params":{"name":"nonexistent","arguments":{}}}"#,
        r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#,
    ];

    for body in requests {
        let stdio = over_stdio(&dispatcher, body).await;
        let http = over_http(&dispatcher, body).await;
        assert_eq!(stdio, http, "{body}");
    }
}

#[tokio::test]
async fn test_failures_are_reported_the_same_way() {
    let dispatcher = dispatcher();
    let body = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"s3_lookup","arguments":{"bucket_name":"missing"}}}"#;

    let response = over_http(&dispatcher, body).await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["error"]["code"], -32603);
    assert_eq!(
        response["error"]["message"],
        "Tool execution error: Bucket missing does not exist"
    );

    let body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"s3_lookup","arguments":{"bucket_name":"lake"}}}"#;
    let response = over_stdio(&dispatcher, body).await;
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(text).unwrap(),
        json!({"bucket": "lake", "objects": []})
    );
}
