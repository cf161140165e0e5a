//! Environments and connections.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{default_page_size, LABEL, SERVICE};
use crate::aws::{ApiRequest, ClientHandle};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::tools::{remote_failure, Input};

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    registry.register_tool(
        "list_environments",
        "Lists environments in Amazon DataZone.",
        client.clone(),
        list_environments,
    )?;
    registry.register_tool(
        "create_connection",
        "Creates a new connection in Amazon DataZone. A connection enables you to connect your \
         resources (domains, projects, and environments) to external resources and services.",
        client.clone(),
        create_connection,
    )?;
    registry.register_tool(
        "get_connection",
        "Gets a connection in Amazon DataZone, optionally including its secrets.",
        client,
        get_connection,
    )?;
    Ok(())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListEnvironmentsParams {
    /// The identifier of the Amazon DataZone domain
    pub domain_identifier: String,
    /// The identifier of the Amazon DataZone project
    pub project_identifier: String,
    #[serde(default = "default_page_size")]
    pub max_results: u32,
    #[serde(default)]
    pub next_token: Option<String>,
    /// The AWS account where you want to list environments
    #[serde(default)]
    pub aws_account_id: Option<String>,
    #[serde(default)]
    pub aws_account_region: Option<String>,
    #[serde(default)]
    pub environment_blueprint_identifier: Option<String>,
    #[serde(default)]
    pub environment_profile_identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    /// ACTIVE, CREATING, UPDATING, DELETING, CREATE_FAILED, UPDATE_FAILED,
    /// DELETE_FAILED, VALIDATION_FAILED, SUSPENDED, DISABLED, EXPIRED,
    /// DELETED or INACCESSIBLE
    #[serde(default)]
    pub status: Option<String>,
}

async fn list_environments(client: ClientHandle, params: ListEnvironmentsParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let input = Input::new()
        .set("domainIdentifier", params.domain_identifier)
        .set("projectIdentifier", params.project_identifier)
        .set("maxResults", params.max_results)
        .opt("nextToken", params.next_token)
        .opt("awsAccountId", params.aws_account_id)
        .opt("awsAccountRegion", params.aws_account_region)
        .opt("environmentBlueprintIdentifier", params.environment_blueprint_identifier)
        .opt("environmentProfileIdentifier", params.environment_profile_identifier)
        .opt("name", params.name)
        .opt("provider", params.provider)
        .opt("status", params.status)
        .build();

    api.call(ApiRequest::new(SERVICE, "ListEnvironments", input))
        .await
        .map_err(|e| remote_failure("list_environments", &e, format!("Error listing environments: {}", e)))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateConnectionParams {
    /// The ID of the domain where the connection is created
    pub domain_identifier: String,
    /// The connection name (at most 64 characters)
    pub name: String,
    #[serde(default)]
    pub environment_identifier: Option<String>,
    /// accessRole, awsAccountId, awsRegion and iamConnectionId of the connection
    #[serde(default)]
    pub aws_location: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub description: Option<String>,
    /// Idempotency token
    #[serde(default)]
    pub client_token: Option<String>,
    /// ConnectionPropertiesInput union, for example `{"athenaProperties": {...}}`
    #[serde(default)]
    pub props: Option<Value>,
}

async fn create_connection(client: ClientHandle, params: CreateConnectionParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("name", params.name)
        .opt("environmentIdentifier", params.environment_identifier)
        .opt("awsLocation", params.aws_location)
        .opt("description", params.description)
        .opt("clientToken", params.client_token)
        .opt("props", params.props)
        .build();

    api.call(ApiRequest::new(SERVICE, "CreateConnection", input))
        .await
        .map_err(|e| {
            let reason = match e.code() {
                Some("AccessDeniedException") => "Access denied while creating connection",
                Some("ConflictException") => "Conflict while creating connection",
                Some("ResourceNotFoundException") => "Resource not found while creating connection",
                Some("ServiceQuotaExceededException") => "Service quota exceeded while creating connection",
                Some("ValidationException") => "Invalid parameters while creating connection",
                _ => "Unexpected error creating connection",
            };
            let message = format!("{} in domain {}: {}", reason, domain, e.message());
            remote_failure("create_connection", &e, message)
        })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetConnectionParams {
    /// The ID of the domain where the connection exists
    pub domain_identifier: String,
    /// The ID of the connection to retrieve
    pub identifier: String,
    /// Include the connection credentials in the response
    #[serde(default)]
    pub with_secret: bool,
}

async fn get_connection(client: ClientHandle, params: GetConnectionParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (domain, identifier) = (params.domain_identifier, params.identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("identifier", &identifier)
        .flag("withSecret", params.with_secret)
        .build();

    api.call(ApiRequest::new(SERVICE, "GetConnection", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("AccessDeniedException") => format!(
                    "Access denied while getting connection {} in domain {}: {}",
                    identifier,
                    domain,
                    e.message()
                ),
                Some("ResourceNotFoundException") => format!(
                    "Connection {} not found in domain {}: {}",
                    identifier,
                    domain,
                    e.message()
                ),
                Some("ValidationException") => format!(
                    "Invalid parameters while getting connection {} in domain {}: {}",
                    identifier,
                    domain,
                    e.message()
                ),
                _ => format!(
                    "Error getting connection {} in domain {}: {}",
                    identifier,
                    domain,
                    e.message()
                ),
            };
            remote_failure("get_connection", &e, message)
        })
}
