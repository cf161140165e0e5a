use serde::Serialize;
use thiserror::Error;

use crate::aws::ServiceError;
use crate::config::ConfigError;

/// Classification of a failed tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ClientConfiguration,
    RemoteService,
    Validation,
    ToolNotFound,
    MethodNotFound,
    Internal,
}

/// Error returned by a tool operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolError {
    #[error("{0}")]
    ClientConfiguration(String),

    #[error("{message}")]
    RemoteService { code: Option<String>, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ClientConfiguration(_) => ErrorKind::ClientConfiguration,
            Self::RemoteService { .. } => ErrorKind::RemoteService,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wraps a remote API failure under a human-readable message, keeping the
    /// remote error code for callers that branch on it.
    pub fn remote(error: &ServiceError, message: impl Into<String>) -> Self {
        Self::RemoteService {
            code: error.code().map(str::to_string),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),
}

pub type Result<T> = std::result::Result<T, McpError>;
