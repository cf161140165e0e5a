//! Scripted stand-in for the AWS API used by unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ApiRequest, AwsApi, ServiceError};

type Key = (&'static str, &'static str);

/// Replays queued responses per `(service, operation)` and records calls.
/// The last queued response of an operation is repeated once the queue is
/// drained, which lets a test script "RUNNING forever" with one entry.
#[derive(Default)]
pub struct ScriptedAws {
    region: String,
    responses: Mutex<HashMap<Key, VecDeque<Result<Value, ServiceError>>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

impl ScriptedAws {
    pub fn new() -> Self {
        Self {
            region: "us-east-1".to_string(),
            ..Default::default()
        }
    }

    pub fn with_region(mut self, region: &str) -> Self {
        self.region = region.to_string();
        self
    }

    pub fn respond(self, service: &'static str, operation: &'static str, value: Value) -> Self {
        self.push(service, operation, Ok(value))
    }

    pub fn fail(self, service: &'static str, operation: &'static str, error: ServiceError) -> Self {
        self.push(service, operation, Err(error))
    }

    fn push(self, service: &'static str, operation: &'static str, response: Result<Value, ServiceError>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .entry((service, operation))
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<ApiRequest> {
        self.calls()
            .into_iter()
            .filter(|c| c.operation == operation)
            .collect()
    }
}

#[async_trait]
impl AwsApi for ScriptedAws {
    fn region(&self) -> &str {
        &self.region
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, ServiceError> {
        let key = (request.service, request.operation);
        self.calls.lock().unwrap().push(request);
        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&key).ok_or_else(|| {
            ServiceError::Transport(format!("no scripted response for {}:{}", key.0, key.1))
        })?;
        match queue.len() {
            0 => Err(ServiceError::Transport("script exhausted".to_string())),
            1 => queue.front().cloned().unwrap_or_else(|| Ok(Value::Null)),
            _ => queue.pop_front().unwrap_or_else(|| Ok(Value::Null)),
        }
    }
}
