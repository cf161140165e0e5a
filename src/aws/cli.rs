use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use base64::Engine;
use bstr::ByteSlice;
use convert_case::{Case, Casing};
use eyre::{Result, WrapErr};
use serde_json::Value;

use super::credentials::Credentials;
use super::{ApiRequest, AwsApi, ServiceError};
use crate::MAX_TOOL_RESPONSE_SIZE;

/// The environment variable name where we set additional metadata for the AWS CLI user agent.
const USER_AGENT_ENV_VAR: &str = "AWS_EXECUTION_ENV";
const USER_AGENT_APP_NAME: &str = "AwsData-MCP-Server";
const USER_AGENT_VERSION_KEY: &str = "Version";
const USER_AGENT_VERSION_VALUE: &str = env!("CARGO_PKG_VERSION");

/// [`AwsApi`] backed by the AWS CLI. Every call spawns
/// `aws --region R --output json --no-paginate <service> <operation> --cli-input-json <input>`
/// and parses the JSON written to stdout.
#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    region: String,
    credentials: Option<Credentials>,
}

impl AwsCli {
    /// `credentials` of `None` leaves the CLI on its ambient credential chain.
    pub fn new(program: impl Into<String>, region: impl Into<String>, credentials: Option<Credentials>) -> Self {
        Self {
            program: program.into(),
            region: region.into(),
            credentials,
        }
    }

    fn args(&self, request: &ApiRequest, input: &Value) -> Vec<String> {
        vec![
            "--region".to_string(),
            self.region.clone(),
            "--output".to_string(),
            "json".to_string(),
            "--no-paginate".to_string(),
            request.service.to_string(),
            cli_operation(request.operation),
            "--cli-input-json".to_string(),
            input.to_string(),
        ]
    }

    async fn run(&self, args: &[String]) -> Result<std::process::Output> {
        let mut command = tokio::process::Command::new(&self.program);
        let existing = std::env::var(USER_AGENT_ENV_VAR).ok();
        command.env(USER_AGENT_ENV_VAR, user_agent_value(existing.as_deref()));
        if let Some(credentials) = &self.credentials {
            command
                .env("AWS_ACCESS_KEY_ID", &credentials.access_key_id)
                .env("AWS_SECRET_ACCESS_KEY", &credentials.secret_access_key);
            match &credentials.session_token {
                Some(token) => command.env("AWS_SESSION_TOKEN", token),
                None => command.env_remove("AWS_SESSION_TOKEN"),
            };
        }
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .wrap_err_with(|| format!("Unable to spawn '{}'", self.program))?
            .wait_with_output()
            .await
            .wrap_err_with(|| format!("Unable to read output of '{}'", self.program))
    }
}

#[async_trait]
impl AwsApi for AwsCli {
    fn region(&self) -> &str {
        &self.region
    }

    async fn call(&self, request: ApiRequest) -> Result<Value, ServiceError> {
        let mut input = request.input.clone();
        let scratch = tempfile::tempdir()
            .map_err(|e| ServiceError::Transport(format!("Unable to create scratch directory: {e}")))?;
        let mut extra_args = Vec::new();
        let mut outfile = None;

        // Object payloads do not fit in --cli-input-json; they go through files.
        match (request.service, request.operation) {
            ("s3api", "PutObject") => {
                let body = input
                    .as_object_mut()
                    .and_then(|map| map.remove("Body"))
                    .unwrap_or(Value::String(String::new()));
                let path = scratch.path().join("body");
                let contents = body.as_str().map(str::to_string).unwrap_or_else(|| body.to_string());
                tokio::fs::write(&path, contents)
                    .await
                    .map_err(|e| ServiceError::Transport(format!("Unable to stage object body: {e}")))?;
                extra_args.push("--body".to_string());
                extra_args.push(path.display().to_string());
            }
            ("s3api", "GetObject") => {
                let path = scratch.path().join("object");
                extra_args.push(path.display().to_string());
                outfile = Some(path);
            }
            _ => {}
        }

        let mut args = self.args(&request, &input);
        args.extend(extra_args);
        tracing::debug!(service = request.service, operation = request.operation, "Calling AWS CLI");

        let output = self
            .run(&args)
            .await
            .map_err(|e| ServiceError::Transport(format!("{e:#}")))?;
        let stdout = output.stdout.to_str_lossy();
        let stderr = output.stderr.to_str_lossy();

        if !output.status.success() {
            return Err(parse_error(request.operation, &stderr));
        }

        let mut response = parse_output(&stdout)?;
        if let Some(path) = outfile {
            response = attach_body(response, &path).await?;
        }
        Ok(response)
    }
}

/// `GetQueryExecution` -> `get-query-execution`.
fn cli_operation(operation: &str) -> String {
    match operation {
        "ListObjectsV2" => "list-objects-v2".to_string(),
        _ => operation.from_case(Case::Pascal).to_case(Case::Kebab),
    }
}

fn user_agent_value(existing: Option<&str>) -> String {
    let metadata = format!(
        "{} {}/{}",
        USER_AGENT_APP_NAME, USER_AGENT_VERSION_KEY, USER_AGENT_VERSION_VALUE
    );
    match existing {
        Some(value) if !value.is_empty() => format!("{} {}", value, metadata),
        _ => metadata,
    }
}

fn parse_output(stdout: &str) -> Result<Value, ServiceError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(trimmed)
        .map_err(|e| ServiceError::Transport(format!("Unable to parse AWS CLI output: {e}")))
}

/// Reads the standard AWS CLI error line
/// `An error occurred (Code) when calling the Op operation: message`.
fn parse_error(operation: &str, stderr: &str) -> ServiceError {
    let text = stderr.trim();
    if let Some((_, rest)) = text.split_once("An error occurred (") {
        if let Some((code, rest)) = rest.split_once(')') {
            let called = rest
                .split_once("when calling the ")
                .and_then(|(_, r)| r.split_once(" operation"))
                .map(|(op, _)| op)
                .unwrap_or(operation);
            let message = rest
                .split_once(" operation: ")
                .map(|(_, m)| m)
                .unwrap_or(rest)
                .trim();
            return ServiceError::api(code, called, message);
        }
    }
    ServiceError::Transport(truncate(text, MAX_TOOL_RESPONSE_SIZE / 3))
}

async fn attach_body(mut response: Value, path: &Path) -> Result<Value, ServiceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ServiceError::Transport(format!("Unable to read object body: {e}")))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    if let Some(map) = response.as_object_mut() {
        map.insert("Body".to_string(), Value::String(encoded));
    }
    Ok(response)
}

fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{} ... truncated", &text[..end])
}
