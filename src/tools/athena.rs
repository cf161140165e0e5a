//! Amazon Athena tools.
//!
//! `athena_execute_sql_query` runs a query inside the Athena workgroup of a
//! DataZone project: it finds an active environment and the project's Athena
//! connection, submits the query and polls until the execution reaches a
//! terminal state or the poll budget runs out.

use std::sync::Arc;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::{sleep, Instant};

use super::{remote_failure, Input};
use crate::aws::{ApiRequest, AwsApi, ClientHandle};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;

const SERVICE: &str = "athena";
const LABEL: &str = "Athena";
const DEFAULT_CATALOG: &str = "AwsDataCatalog";

/// How often and for how long a submitted query is polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub budget: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            budget: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone)]
struct Athena {
    client: ClientHandle,
    poll: PollPolicy,
}

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    register_with_policy(registry, client, PollPolicy::default())
}

pub fn register_with_policy(registry: &ToolRegistry, client: ClientHandle, poll: PollPolicy) -> Result<()> {
    let context = Athena { client, poll };
    registry.register_tool(
        "athena_execute_sql_query",
        "Executes a SQL query against data in a DataZone project environment and returns \
         column metadata, result rows and execution statistics.",
        context.clone(),
        execute_sql_query,
    )?;
    registry.register_tool(
        "athena_describe_available_tables",
        "Describes the available tables in an Athena database.",
        context,
        describe_available_tables,
    )?;
    Ok(())
}

/// Lifecycle of a query execution as reported by `GetQueryExecution`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    Other(String),
}

impl QueryState {
    fn parse(state: &str) -> Self {
        match state {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

fn default_query_results() -> u32 {
    100
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteSqlQueryParams {
    /// The ID of the domain (e.g. "dzd_bvgcinc6awq8kn")
    pub domain_identifier: String,
    /// The ID of the project with access to the data
    pub project_identifier: String,
    /// The SQL query to execute
    pub sql_query: String,
    /// The specific database name to query
    #[serde(default)]
    pub database_name: Option<String>,
    /// Maximum number of results to return
    #[serde(default = "default_query_results")]
    pub max_results: u32,
}

async fn execute_sql_query(context: Athena, params: ExecuteSqlQueryParams) -> std::result::Result<Value, ToolError> {
    tracing::info!(project = %params.project_identifier, "Executing SQL query");
    run_query(&context, params).await.map_err(|e| {
        let message = format!("Athena SQL query failed: {}", e);
        tracing::error!("{}", message);
        match e {
            ToolError::ClientConfiguration(_) => ToolError::ClientConfiguration(message),
            ToolError::RemoteService { code, .. } => ToolError::RemoteService { code, message },
            ToolError::Validation(_) => ToolError::Validation(message),
            ToolError::Internal(_) => ToolError::Internal(message),
        }
    })
}

async fn run_query(context: &Athena, params: ExecuteSqlQueryParams) -> std::result::Result<Value, ToolError> {
    let api = context.client.api(LABEL)?;
    let project = params.project_identifier.as_str();
    let workgroup = find_workgroup(api.as_ref(), &params.domain_identifier, project).await?;

    let identity = call(api.as_ref(), "sts", "GetCallerIdentity", json!({})).await?;
    let account = identity.get("Account").and_then(Value::as_str).unwrap_or("unknown");

    let mut input = Input::new()
        .set("QueryString", &params.sql_query)
        .set("WorkGroup", &workgroup)
        .set(
            "ResultConfiguration",
            json!({"OutputLocation": format!("s3://aws-athena-query-results-{}-{}/", account, api.region())}),
        );
    if let Some(database) = params.database_name.filter(|d| !d.is_empty()) {
        input = input.set("QueryExecutionContext", json!({ "Database": database }));
    }

    tracing::info!(%workgroup, "Starting query execution");
    let started = call(api.as_ref(), SERVICE, "StartQueryExecution", input.build()).await?;
    let execution_id = started
        .get("QueryExecutionId")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::Internal("StartQueryExecution returned no QueryExecutionId".to_string()))?
        .to_string();

    let execution = wait_for_query(api.as_ref(), &execution_id, context.poll).await?;

    tracing::info!(%execution_id, "Query execution completed, fetching results");
    let results = call(
        api.as_ref(),
        SERVICE,
        "GetQueryResults",
        json!({"QueryExecutionId": execution_id, "MaxResults": params.max_results}),
    )
    .await?;

    let formatted = format_results(&execution, &results);
    tracing::info!(rows = formatted["rows"].as_array().map_or(0, Vec::len), "Query completed successfully");
    Ok(formatted)
}

async fn call(api: &dyn AwsApi, service: &'static str, operation: &'static str, input: Value) -> std::result::Result<Value, ToolError> {
    api.call(ApiRequest::new(service, operation, input))
        .await
        .map_err(|e| remote_failure(operation, &e, e.to_string()))
}

fn failure(message: impl Into<String>) -> ToolError {
    ToolError::RemoteService {
        code: None,
        message: message.into(),
    }
}

/// Workgroup of the project's Athena connection. The project must have an
/// active environment.
async fn find_workgroup(api: &dyn AwsApi, domain: &str, project: &str) -> std::result::Result<String, ToolError> {
    let environments = call(
        api,
        "datazone",
        "ListEnvironments",
        json!({"domainIdentifier": domain, "projectIdentifier": project}),
    )
    .await?;
    let active = items(&environments)
        .iter()
        .any(|env| env.get("status").and_then(Value::as_str) == Some("ACTIVE"));
    if !active {
        return Err(failure(format!("No active environment found for project {}", project)));
    }

    let connections = call(
        api,
        "datazone",
        "ListConnections",
        json!({"domainIdentifier": domain, "projectIdentifier": project, "type": "ATHENA"}),
    )
    .await?;
    let connection = items(&connections)
        .iter()
        .find(|conn| conn.get("type").and_then(Value::as_str) == Some("ATHENA"))
        .ok_or_else(|| failure(format!("No Athena connection found for project {}", project)))?;

    connection
        .pointer("/props/athenaProperties/workgroupName")
        .and_then(Value::as_str)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .ok_or_else(|| failure("No Athena workgroup found in connection properties"))
}

fn items(response: &Value) -> &[Value] {
    response
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Polls `GetQueryExecution` until the query succeeds. Failure, cancellation
/// and an exhausted budget end the wait with an error. The budget is checked
/// before every poll.
async fn wait_for_query(api: &dyn AwsApi, execution_id: &str, poll: PollPolicy) -> std::result::Result<Value, ToolError> {
    let started = Instant::now();
    let mut state = QueryState::Running;
    let mut response = None;

    while !state.is_terminal() && started.elapsed() < poll.budget {
        let current = call(
            api,
            SERVICE,
            "GetQueryExecution",
            json!({ "QueryExecutionId": execution_id }),
        )
        .await?;
        let status = current.pointer("/QueryExecution/Status");
        state = QueryState::parse(
            status
                .and_then(|s| s.get("State"))
                .and_then(Value::as_str)
                .unwrap_or_default(),
        );

        match &state {
            QueryState::Failed => {
                let reason = status
                    .and_then(|s| s.get("StateChangeReason"))
                    .and_then(Value::as_str)
                    .unwrap_or("Unknown error");
                return Err(failure(format!("Query execution failed: {}", reason)));
            }
            QueryState::Cancelled => return Err(failure("Query execution was cancelled")),
            QueryState::Succeeded => {
                response = Some(current);
                break;
            }
            QueryState::Queued | QueryState::Running | QueryState::Other(_) => {
                tracing::debug!(%execution_id, state = ?state, "Query still in progress");
                response = Some(current);
            }
        }

        sleep(poll.interval).await;
    }

    if !state.is_terminal() {
        return Err(failure("Query execution timed out"));
    }
    response.ok_or_else(|| failure("Query execution response not available"))
}

fn format_results(execution: &Value, results: &Value) -> Value {
    let columns: Vec<Value> = results
        .pointer("/ResultSet/ResultSetMetadata/ColumnInfo")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|column| json!({"name": column.get("Name"), "type": column.get("Type")}))
        .collect();

    // The first row repeats the column names.
    let rows: Vec<Value> = results
        .pointer("/ResultSet/Rows")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .skip(1)
        .map(|row| {
            let data = row.get("Data").and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default();
            data.iter()
                .map(|cell| cell.get("VarCharValue").cloned().unwrap_or_else(|| json!("")))
                .collect()
        })
        .collect();

    let statistics = execution.pointer("/QueryExecution/Statistics");
    json!({
        "columns": columns,
        "rows": rows,
        "execution_time_ms": statistics.and_then(|s| s.get("TotalExecutionTimeInMillis")),
        "data_scanned_bytes": statistics.and_then(|s| s.get("DataScannedInBytes")),
    })
}

fn default_table_results() -> u32 {
    50
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DescribeTablesParams {
    /// The name of the database to describe tables from
    pub database_name: String,
    /// The name of the workgroup to use
    #[serde(default)]
    pub workgroup: Option<String>,
    /// The name of the data catalog (defaults to AwsDataCatalog)
    #[serde(default)]
    pub catalog_name: Option<String>,
    /// Maximum number of tables to return
    #[serde(default = "default_table_results")]
    pub max_results: u32,
    /// Token for pagination
    #[serde(default)]
    pub next_token: Option<String>,
}

async fn describe_available_tables(context: Athena, params: DescribeTablesParams) -> std::result::Result<Value, ToolError> {
    let api: Arc<dyn AwsApi> = context.client.api(LABEL)?;
    let database = params.database_name;
    tracing::info!(%database, "Describing tables");

    let catalog = params
        .catalog_name
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATALOG.to_string());
    let input = Input::new()
        .set("CatalogName", catalog)
        .set("DatabaseName", &database)
        .set("MaxResults", params.max_results)
        .opt("WorkGroup", params.workgroup)
        .opt("NextToken", params.next_token)
        .build();

    let response = api
        .call(ApiRequest::new(SERVICE, "ListTableMetadata", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("InvalidRequestException") => format!("Invalid request: {}", e),
                Some("MetadataException") => format!("Metadata error: {}", e),
                Some(_) => format!("Error describing tables: {}", e),
                None => format!("Unexpected error describing tables: {}", e),
            };
            remote_failure("describe_available_tables", &e, message)
        })?;

    let tables: Vec<Value> = response
        .get("TableMetadataList")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .map(|table| {
            let columns: Vec<Value> = table
                .get("Columns")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(|c| json!({"name": c.get("Name"), "type": c.get("Type"), "comment": c.get("Comment")}))
                .collect();
            json!({
                "name": table.get("Name"),
                "type": table.get("TableType"),
                "create_time": table.get("CreateTime"),
                "last_access_time": table.get("LastAccessTime"),
                "parameters": table.get("Parameters").cloned().unwrap_or_else(|| json!({})),
                "columns": columns,
            })
        })
        .collect();

    tracing::info!(count = tables.len(), %database, "Found tables");
    Ok(json!({
        "tables": tables,
        "next_token": response.get("NextToken"),
    }))
}
