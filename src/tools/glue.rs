//! AWS Glue Data Catalog and crawler tools.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{remote_failure, Input};
use crate::aws::{ApiRequest, ClientHandle};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;

const SERVICE: &str = "glue";
const LABEL: &str = "Glue";
const MAX_TABLES: u32 = 100;

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    registry.register_tool(
        "glue_create_database",
        "Creates a new database in the AWS Glue Data Catalog.",
        client.clone(),
        create_database,
    )?;
    registry.register_tool(
        "glue_create_crawler",
        "Creates a new crawler with specified targets, role, configuration, and optional schedule.",
        client.clone(),
        create_crawler,
    )?;
    registry.register_tool(
        "glue_start_crawler",
        "Starts a crawl using the specified crawler, regardless of what is scheduled.",
        client.clone(),
        start_crawler,
    )?;
    registry.register_tool(
        "glue_get_crawler",
        "Retrieves metadata for a specified crawler.",
        client.clone(),
        get_crawler,
    )?;
    registry.register_tool(
        "glue_get_tables",
        "Retrieves the definitions of some or all of the tables in a given database.",
        client.clone(),
        get_tables,
    )?;
    registry.register_tool(
        "glue_get_table",
        "Retrieves the Table definition in a Data Catalog for a specified table.",
        client,
        get_table,
    )?;
    Ok(())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDatabaseParams {
    /// The name of the database to create
    pub name: String,
    /// The ID of the Data Catalog in which to create the database
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// The location of the database (for example, an HDFS path)
    #[serde(default)]
    pub location_uri: Option<String>,
    /// Key-value pairs that define parameters and properties of the database
    #[serde(default)]
    pub parameters: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
    /// Default permissions on tables created in the database
    #[serde(default)]
    pub create_table_default_permissions: Option<Vec<Value>>,
    /// A FederatedDatabase structure that references an external database
    #[serde(default)]
    pub federated_database: Option<BTreeMap<String, String>>,
    /// A DatabaseIdentifier structure describing a target database for resource linking
    #[serde(default)]
    pub target_database: Option<BTreeMap<String, String>>,
}

async fn create_database(client: ClientHandle, params: CreateDatabaseParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let name = params.name;
    tracing::info!(database = %name, "Creating database");

    // Optional database members are forwarded even when empty.
    let mut database_input = Input::new().set("Name", &name);
    if let Some(description) = params.description {
        database_input = database_input.set("Description", description);
    }
    if let Some(location_uri) = params.location_uri {
        database_input = database_input.set("LocationUri", location_uri);
    }
    if let Some(parameters) = params.parameters {
        database_input = database_input.set("Parameters", parameters);
    }
    if let Some(permissions) = params.create_table_default_permissions {
        database_input = database_input.set("CreateTableDefaultPermissions", permissions);
    }
    if let Some(federated) = params.federated_database {
        database_input = database_input.set("FederatedDatabase", federated);
    }
    if let Some(target) = params.target_database {
        database_input = database_input.set("TargetDatabase", target);
    }

    let input = Input::new()
        .set("DatabaseInput", database_input.build())
        .opt("CatalogId", params.catalog_id)
        .opt("Tags", params.tags)
        .build();

    let response = api
        .call(ApiRequest::new(SERVICE, "CreateDatabase", input))
        .await
        .map_err(|e| {
            let message = match e.code() {
                Some("AlreadyExistsException") => format!("Database {} already exists", name),
                Some("InvalidInputException") => format!("Invalid input provided for creating database {}", name),
                Some("OperationTimeoutException") => format!("Operation timed out while creating database {}", name),
                Some("ResourceNumberLimitExceededException") => {
                    format!("Resource limit exceeded while creating database {}", name)
                }
                _ => format!("Error creating database {}: {}", name, e),
            };
            remote_failure("create_database", &e, message)
        })?;

    tracing::info!(database = %name, "Created database");
    Ok(response)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCrawlerParams {
    /// Name of the new crawler
    pub name: String,
    /// The IAM role or ARN of an IAM role used by the crawler to access customer resources
    pub role: String,
    /// Collection of targets to crawl, keyed by target kind (S3Targets, JdbcTargets, ...)
    pub targets: BTreeMap<String, Vec<Value>>,
    /// The AWS Glue database where results are written
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub classifiers: Option<Vec<String>>,
    /// Crawler configuration information as a versioned JSON string
    #[serde(default)]
    pub configuration: Option<String>,
    #[serde(default)]
    pub crawler_security_configuration: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lake_formation_configuration: Option<Value>,
    #[serde(default)]
    pub lineage_configuration: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub recrawl_policy: Option<BTreeMap<String, String>>,
    /// A cron expression used to specify the schedule
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub schema_change_policy: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub table_prefix: Option<String>,
    #[serde(default)]
    pub tags: Option<BTreeMap<String, String>>,
}

async fn create_crawler(client: ClientHandle, params: CreateCrawlerParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let name = params.name;
    tracing::info!(crawler = %name, "Creating crawler");

    let input = Input::new()
        .set("Name", &name)
        .set("Role", params.role)
        .set("Targets", params.targets)
        .opt("DatabaseName", params.database_name)
        .opt("Classifiers", params.classifiers)
        .opt("Configuration", params.configuration)
        .opt("CrawlerSecurityConfiguration", params.crawler_security_configuration)
        .opt("Description", params.description)
        .opt("LakeFormationConfiguration", params.lake_formation_configuration)
        .opt("LineageConfiguration", params.lineage_configuration)
        .opt("RecrawlPolicy", params.recrawl_policy)
        .opt("Schedule", params.schedule)
        .opt("SchemaChangePolicy", params.schema_change_policy)
        .opt("TablePrefix", params.table_prefix)
        .opt("Tags", params.tags)
        .build();

    api.call(ApiRequest::new(SERVICE, "CreateCrawler", input))
        .await
        .map_err(|e| remote_failure("create_crawler", &e, format!("Error creating crawler {}: {}", name, e)))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CrawlerNameParams {
    /// Name of the crawler
    pub name: String,
}

async fn start_crawler(client: ClientHandle, params: CrawlerNameParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    tracing::info!(crawler = %params.name, "Starting crawler");
    api.call(ApiRequest::new(SERVICE, "StartCrawler", serde_json::json!({ "Name": params.name })))
        .await
        .map_err(|e| remote_failure("start_crawler", &e, format!("Error starting crawler {}: {}", params.name, e)))
}

async fn get_crawler(client: ClientHandle, params: CrawlerNameParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    api.call(ApiRequest::new(SERVICE, "GetCrawler", serde_json::json!({ "Name": params.name })))
        .await
        .map_err(|e| remote_failure("get_crawler", &e, format!("Error getting crawler {}: {}", params.name, e)))
}

fn default_max_tables() -> u32 {
    MAX_TABLES
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTablesParams {
    /// The database in the catalog whose tables to list
    pub database_name: String,
    #[serde(default)]
    pub catalog_id: Option<String>,
    /// A regular expression pattern to filter table names
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub include_status_details: bool,
    /// Maximum number of tables to return (1-100)
    #[serde(default = "default_max_tables")]
    pub max_results: u32,
    #[serde(default)]
    pub next_token: Option<String>,
    /// The time as of when to read the table contents
    #[serde(default)]
    pub query_as_of_time: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// The table fields to return
    #[serde(default)]
    pub attributes_to_get: Option<Vec<String>>,
}

async fn get_tables(client: ClientHandle, params: GetTablesParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let database = params.database_name;
    tracing::info!(%database, "Getting tables");

    let input = Input::new()
        .set("DatabaseName", &database)
        .set("MaxResults", params.max_results.min(MAX_TABLES))
        .opt("CatalogId", params.catalog_id)
        .opt("Expression", params.expression)
        .flag("IncludeStatusDetails", params.include_status_details)
        .opt("NextToken", params.next_token)
        .opt("QueryAsOfTime", params.query_as_of_time)
        .opt("TransactionId", params.transaction_id)
        .opt("AttributesToGet", params.attributes_to_get)
        .build();

    api.call(ApiRequest::new(SERVICE, "GetTables", input))
        .await
        .map_err(|e| {
            remote_failure(
                "get_tables",
                &e,
                format!("Error getting tables from database {}: {}", database, e),
            )
        })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetTableParams {
    /// The database in which the table resides
    pub database_name: String,
    /// The name of the table
    pub name: String,
    #[serde(default)]
    pub catalog_id: Option<String>,
    #[serde(default)]
    pub include_status_details: bool,
    #[serde(default)]
    pub query_as_of_time: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

async fn get_table(client: ClientHandle, params: GetTableParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (database, name) = (params.database_name, params.name);

    let input = Input::new()
        .set("DatabaseName", &database)
        .set("Name", &name)
        .opt("CatalogId", params.catalog_id)
        .flag("IncludeStatusDetails", params.include_status_details)
        .opt("QueryAsOfTime", params.query_as_of_time)
        .opt("TransactionId", params.transaction_id)
        .build();

    api.call(ApiRequest::new(SERVICE, "GetTable", input))
        .await
        .map_err(|e| {
            remote_failure(
                "get_table",
                &e,
                format!("Error getting table {} from database {}: {}", name, database, e),
            )
        })
}
