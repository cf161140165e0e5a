pub mod app;
pub mod aws;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod invoker;
pub mod mcp_server;
pub mod protocol;
pub mod registry;
pub mod service;
pub mod tools;

pub use dispatch::Dispatcher;
pub use error::{ErrorKind, McpError, ToolError};
pub use invoker::InvocationResult;
pub use mcp_server::StdioServer;
pub use registry::{ToolDescriptor, ToolHandler, ToolRegistry};
pub use service::Service;

/// Maximum size for tool response output
pub const MAX_TOOL_RESPONSE_SIZE: usize = 100_000;
