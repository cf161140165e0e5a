//! Access to the AWS APIs behind the tools.
//!
//! Tools never talk to a concrete client. They go through [`ClientHandle`],
//! which is either a ready [`AwsApi`] or a typed "not configured" state
//! carrying the reason the credential provider gave up.

pub mod cli;
pub mod credentials;

#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::error::ToolError;

/// One remote API call, named the way the AWS API reference names it.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Service as used by the AWS CLI (`datazone`, `glue`, `s3api`, ...).
    pub service: &'static str,
    /// Operation in PascalCase (`GetQueryExecution`).
    pub operation: &'static str,
    /// Request shape, using the API's own member names.
    pub input: Value,
}

impl ApiRequest {
    pub fn new(service: &'static str, operation: &'static str, input: Value) -> Self {
        Self {
            service,
            operation,
            input,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Structured error returned by the AWS API.
    #[error("An error occurred ({code}) when calling the {operation} operation: {message}")]
    Api {
        code: String,
        operation: String,
        message: String,
    },

    /// The call never produced an API response (client missing, unreadable output).
    #[error("{0}")]
    Transport(String),
}

impl ServiceError {
    pub fn api(code: impl Into<String>, operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            code: code.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// The AWS error code, if the API returned one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Transport(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Api { message, .. } => message,
            Self::Transport(message) => message,
        }
    }
}

/// A client able to perform AWS API calls. Shared read-only across
/// concurrent invocations.
#[async_trait]
pub trait AwsApi: Send + Sync {
    /// Region the client signs requests for.
    fn region(&self) -> &str;

    async fn call(&self, request: ApiRequest) -> Result<Value, ServiceError>;
}

/// What the tools receive at registration time.
#[derive(Clone)]
pub enum ClientHandle {
    Ready(Arc<dyn AwsApi>),
    NotConfigured(Arc<str>),
}

impl ClientHandle {
    pub fn ready(api: impl AwsApi + 'static) -> Self {
        Self::Ready(Arc::new(api))
    }

    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured(Arc::from(reason.into()))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The API client, or a client-configuration failure naming `label`
    /// (for example "Glue") so callers see which client was missing.
    pub fn api(&self, label: &str) -> Result<Arc<dyn AwsApi>, ToolError> {
        match self {
            Self::Ready(api) => Ok(api.clone()),
            Self::NotConfigured(reason) => Err(ToolError::ClientConfiguration(format!(
                "{label} client not initialized: {reason}"
            ))),
        }
    }
}

impl std::fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(api) => f.debug_tuple("Ready").field(&api.region()).finish(),
            Self::NotConfigured(reason) => f.debug_tuple("NotConfigured").field(reason).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_service_error_display_matches_aws_format() {
        let err = ServiceError::api("AccessDenied", "GetObject", "Access Denied");
        assert_eq!(
            err.to_string(),
            "An error occurred (AccessDenied) when calling the GetObject operation: Access Denied"
        );
        assert_eq!(err.code(), Some("AccessDenied"));
        assert_eq!(ServiceError::Transport("boom".into()).code(), None);
    }

    #[test]
    fn test_not_configured_handle_reports_client_configuration() {
        let handle = ClientHandle::not_configured("no credentials");
        assert!(!handle.is_ready());
        let err = handle.api("Glue").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ClientConfiguration);
        assert_eq!(err.to_string(), "Glue client not initialized: no credentials");
    }
}
