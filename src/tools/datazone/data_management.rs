//! Assets, listings, data sources, subscriptions and metadata form types.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{default_page_size, LABEL, MAX_PAGE_SIZE, SERVICE};
use crate::aws::{ApiRequest, ClientHandle, ServiceError};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::tools::{remote_failure, Input};

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    registry.register_tool(
        "get_asset",
        "Retrieves detailed information about a specific asset in Amazon DataZone.",
        client.clone(),
        get_asset,
    )?;
    registry.register_tool(
        "create_asset",
        "Creates an asset in the Amazon DataZone catalog.",
        client.clone(),
        create_asset,
    )?;
    registry.register_tool(
        "publish_asset",
        "Publishes an asset to the Amazon DataZone catalog.",
        client.clone(),
        publish_asset,
    )?;
    registry.register_tool(
        "get_listing",
        "Gets a listing (a record of an asset at a given time) in Amazon DataZone.",
        client.clone(),
        get_listing,
    )?;
    registry.register_tool(
        "search_listings",
        "Searches listings (records of assets) in Amazon DataZone with filtering and sorting options.",
        client.clone(),
        search_listings,
    )?;
    registry.register_tool(
        "create_data_source",
        "Creates a data source in Amazon DataZone and associates it with a project.",
        client.clone(),
        create_data_source,
    )?;
    registry.register_tool(
        "get_data_source",
        "Retrieves detailed information about a specific data source in Amazon DataZone.",
        client.clone(),
        get_data_source,
    )?;
    registry.register_tool(
        "start_data_source_run",
        "Starts a data source run in Amazon DataZone.",
        client.clone(),
        start_data_source_run,
    )?;
    registry.register_tool(
        "create_subscription_request",
        "Creates a subscription request in Amazon DataZone.",
        client.clone(),
        create_subscription_request,
    )?;
    registry.register_tool(
        "accept_subscription_request",
        "Accepts a subscription request to a specific asset in Amazon DataZone.",
        client.clone(),
        accept_subscription_request,
    )?;
    registry.register_tool(
        "get_subscription",
        "Gets a subscription in Amazon DataZone.",
        client.clone(),
        get_subscription,
    )?;
    registry.register_tool(
        "get_form_type",
        "Retrieves detailed information about a specific metadata form type in Amazon DataZone.",
        client.clone(),
        get_form_type,
    )?;
    registry.register_tool(
        "create_form_type",
        "Creates a new metadata form type in Amazon DataZone.",
        client.clone(),
        create_form_type,
    )?;
    registry.register_tool(
        "list_data_sources",
        "Lists the data sources of a project in an Amazon DataZone domain.",
        client,
        list_data_sources,
    )?;
    Ok(())
}

async fn send(
    client: &ClientHandle,
    operation: &'static str,
    input: Value,
    describe: impl FnOnce(&ServiceError) -> String,
) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    api.call(ApiRequest::new(SERVICE, operation, input))
        .await
        .map_err(|e| remote_failure(operation, &e, describe(&e)))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetAssetParams {
    /// The ID of the domain containing the asset
    pub domain_identifier: String,
    /// The ID of the asset to retrieve
    pub asset_identifier: String,
    /// Revision of the asset; the latest when omitted
    #[serde(default)]
    pub revision: Option<String>,
}

async fn get_asset(client: ClientHandle, params: GetAssetParams) -> std::result::Result<Value, ToolError> {
    let (domain, asset) = (params.domain_identifier, params.asset_identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("identifier", &asset)
        .opt("revision", params.revision)
        .build();

    send(&client, "GetAsset", input, |e| match e.code() {
        Some("AccessDeniedException") => format!("Access denied while getting asset {} in domain {}", asset, domain),
        Some("InternalServerException") => format!(
            "Unknown error, exception or failure while getting asset {} in domain {}",
            asset, domain
        ),
        Some("ResourceNotFoundException") => format!("Data asset {} or domain {} not found", asset, domain),
        Some("ThrottlingException") => format!("Request throttled while getting asset {} in domain {}", asset, domain),
        Some("UnauthorizedException") => format!("Unauthorized to get asset {} in domain {}", asset, domain),
        Some("ValidationException") => format!("Invalid input while getting asset {} in domain {}", asset, domain),
        _ => format!("Error getting asset {} in domain {}: {}", asset, domain, e),
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateAssetParams {
    pub domain_identifier: String,
    /// Asset name
    pub name: String,
    /// The ID of the asset type
    pub type_identifier: String,
    /// The ID of the project that owns the asset
    pub owning_project_identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_identifier: Option<String>,
    /// Metadata forms: `{content, formName, typeIdentifier, typeRevision}`
    #[serde(default)]
    pub forms_input: Option<Vec<Value>>,
    #[serde(default)]
    pub glossary_terms: Option<Vec<String>>,
    /// For example `{"businessNameGeneration": {"enabled": true}}`
    #[serde(default)]
    pub prediction_configuration: Option<Value>,
    #[serde(default)]
    pub type_revision: Option<String>,
    #[serde(default)]
    pub client_token: Option<String>,
}

async fn create_asset(client: ClientHandle, params: CreateAssetParams) -> std::result::Result<Value, ToolError> {
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("name", params.name)
        .set("typeIdentifier", params.type_identifier)
        .set("owningProjectIdentifier", params.owning_project_identifier)
        .opt("description", params.description)
        .opt("externalIdentifier", params.external_identifier)
        .opt("formsInput", params.forms_input)
        .opt("glossaryTerms", params.glossary_terms)
        .opt("predictionConfiguration", params.prediction_configuration)
        .opt("typeRevision", params.type_revision)
        .opt("clientToken", params.client_token)
        .build();

    send(&client, "CreateAsset", input, |e| match e.code() {
        Some("AccessDeniedException") => format!("Access denied while creating asset in domain {}", domain),
        Some("InternalServerException") => {
            format!("Unknown error, exception or failure while creating asset in domain {}", domain)
        }
        Some("ResourceNotFoundException") => format!("Domain {} not found", domain),
        Some("ThrottlingException") => format!("Request throttled while creating asset in domain {}", domain),
        Some("UnauthorizedException") => format!("Unauthorized to create asset in domain {}", domain),
        Some("ValidationException") => format!("Invalid input while creating asset in domain {}", domain),
        Some("ConflictException") => format!("There is a conflict while creating asset in domain {}", domain),
        _ => format!("Error creating asset in domain {}: {}", domain, e),
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PublishAssetParams {
    pub domain_identifier: String,
    /// The ID of the asset to publish
    pub asset_identifier: String,
    #[serde(default)]
    pub revision: Option<String>,
    #[serde(default)]
    pub client_token: Option<String>,
}

async fn publish_asset(client: ClientHandle, params: PublishAssetParams) -> std::result::Result<Value, ToolError> {
    let (domain, asset) = (params.domain_identifier, params.asset_identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("identifier", &asset)
        .opt("revision", params.revision)
        .opt("clientToken", params.client_token)
        .build();

    send(&client, "PublishAsset", input, |e| {
        format!("Error publishing asset {} in domain {}: {}", asset, domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetListingParams {
    pub domain_identifier: String,
    /// The ID of the listing
    pub identifier: String,
    #[serde(default)]
    pub listing_revision: Option<String>,
}

async fn get_listing(client: ClientHandle, params: GetListingParams) -> std::result::Result<Value, ToolError> {
    let (domain, identifier) = (params.domain_identifier, params.identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("identifier", &identifier)
        .opt("listingRevision", params.listing_revision)
        .build();

    send(&client, "GetListing", input, |e| {
        format!("Error getting listing {} in domain {}: {}", identifier, domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchListingsParams {
    pub domain_identifier: String,
    /// Free text to search for
    #[serde(default)]
    pub search_text: Option<String>,
    /// Maximum number of listings to return (1-50)
    #[serde(default = "default_page_size")]
    pub max_results: u32,
    #[serde(default)]
    pub next_token: Option<String>,
    /// Extra attributes to return, for example `["FORMS"]`
    #[serde(default)]
    pub additional_attributes: Option<Vec<String>>,
    /// Attributes to search in, for example `[{"attribute": "name"}]`
    #[serde(default)]
    pub search_in: Option<Vec<Value>>,
    /// For example `{"attribute": "name", "order": "ASCENDING"}`
    #[serde(default)]
    pub sort: Option<Value>,
}

async fn search_listings(client: ClientHandle, params: SearchListingsParams) -> std::result::Result<Value, ToolError> {
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("maxResults", params.max_results.min(MAX_PAGE_SIZE))
        .opt("searchText", params.search_text)
        .opt("nextToken", params.next_token)
        .opt("additionalAttributes", params.additional_attributes)
        .opt("searchIn", params.search_in)
        .opt("sort", params.sort)
        .build();

    send(&client, "SearchListings", input, |e| {
        format!("Error searching listings in domain {}: {}", domain, e)
    })
    .await
}

fn enabled() -> String {
    "ENABLED".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateDataSourceParams {
    pub domain_identifier: String,
    /// The project the data source is associated with
    pub project_identifier: String,
    pub name: String,
    /// Data source type, for example GLUE or REDSHIFT
    pub data_src_type: String,
    #[serde(default)]
    pub description: Option<String>,
    /// ENABLED or DISABLED
    #[serde(default = "enabled")]
    pub enable_setting: String,
    #[serde(default)]
    pub environment_identifier: Option<String>,
    #[serde(default)]
    pub connection_identifier: Option<String>,
    /// Type specific configuration, for example `{"glueRunConfiguration": {...}}`
    #[serde(default)]
    pub configuration: Option<Value>,
    #[serde(default)]
    pub asset_forms_input: Option<Vec<Value>>,
    /// Publish imported assets to the catalog
    #[serde(default)]
    pub publish_on_import: bool,
    #[serde(default)]
    pub recommendation: Option<Value>,
    /// For example `{"schedule": "cron(0 12 * * ? *)", "timezone": "UTC"}`
    #[serde(default)]
    pub schedule: Option<Value>,
    #[serde(default)]
    pub client_token: Option<String>,
}

async fn create_data_source(client: ClientHandle, params: CreateDataSourceParams) -> std::result::Result<Value, ToolError> {
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("projectIdentifier", params.project_identifier)
        .set("name", params.name)
        .set("type", params.data_src_type)
        .set("enableSetting", params.enable_setting)
        .set("publishOnImport", params.publish_on_import)
        .opt("description", params.description)
        .opt("environmentIdentifier", params.environment_identifier)
        .opt("connectionIdentifier", params.connection_identifier)
        .opt("configuration", params.configuration)
        .opt("assetFormsInput", params.asset_forms_input)
        .opt("recommendation", params.recommendation)
        .opt("schedule", params.schedule)
        .opt("clientToken", params.client_token)
        .build();

    send(&client, "CreateDataSource", input, |e| {
        format!("Error creating data source in domain {}: {}", domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetDataSourceParams {
    pub domain_identifier: String,
    /// The ID of the data source
    pub identifier: String,
}

async fn get_data_source(client: ClientHandle, params: GetDataSourceParams) -> std::result::Result<Value, ToolError> {
    let identifier = params.identifier;
    let input = json!({"domainIdentifier": params.domain_identifier, "identifier": identifier});
    send(&client, "GetDataSource", input, |e| {
        format!("Error getting data source {}: {}", identifier, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct StartDataSourceRunParams {
    pub domain_identifier: String,
    pub data_source_identifier: String,
    #[serde(default)]
    pub client_token: Option<String>,
}

async fn start_data_source_run(
    client: ClientHandle,
    params: StartDataSourceRunParams,
) -> std::result::Result<Value, ToolError> {
    let (domain, source) = (params.domain_identifier, params.data_source_identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("dataSourceIdentifier", &source)
        .opt("clientToken", params.client_token)
        .build();

    send(&client, "StartDataSourceRun", input, |e| {
        let reason = match e.code() {
            Some("ResourceNotFoundException") => {
                return format!("Data source {} or domain {} not found", source, domain);
            }
            Some("UnauthorizedException") => {
                return format!("Unauthorized to start data source run for {} in domain {}", source, domain);
            }
            Some("AccessDeniedException") => "Access denied while",
            Some("ConflictException") => "Conflict while",
            Some("InternalServerException") => "Internal server error while",
            Some("ServiceQuotaExceededException") => "Service quota exceeded while",
            Some("ThrottlingException") => "Request throttled while",
            Some("ValidationException") => "Invalid input while",
            _ => {
                return format!("Error starting data source run for {} in domain {}: {}", source, domain, e);
            }
        };
        format!("{} starting data source run for {} in domain {}", reason, source, domain)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSubscriptionRequestParams {
    pub domain_identifier: String,
    /// Why the subscription is requested
    pub request_reason: String,
    /// Listings to subscribe to, for example `[{"identifier": "listing-id"}]`
    pub subscribed_listings: Vec<Value>,
    /// Subscribers, for example `[{"project": {"identifier": "project-id"}}]`
    pub subscribed_principals: Vec<Value>,
    #[serde(default)]
    pub metadata_forms: Option<Vec<Value>>,
    #[serde(default)]
    pub client_token: Option<String>,
}

async fn create_subscription_request(
    client: ClientHandle,
    params: CreateSubscriptionRequestParams,
) -> std::result::Result<Value, ToolError> {
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("requestReason", params.request_reason)
        .set("subscribedListings", params.subscribed_listings)
        .set("subscribedPrincipals", params.subscribed_principals)
        .opt("metadataForms", params.metadata_forms)
        .opt("clientToken", params.client_token)
        .build();

    send(&client, "CreateSubscriptionRequest", input, |e| {
        format!("Error creating subscription request in domain {}: {}", domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AcceptSubscriptionRequestParams {
    pub domain_identifier: String,
    /// The ID of the subscription request
    pub identifier: String,
    /// For example `[{"assetId": "asset-id", "filterIds": ["filter-id"]}]`
    #[serde(default)]
    pub asset_scopes: Option<Vec<Value>>,
    #[serde(default)]
    pub decision_comment: Option<String>,
}

async fn accept_subscription_request(
    client: ClientHandle,
    params: AcceptSubscriptionRequestParams,
) -> std::result::Result<Value, ToolError> {
    let (domain, identifier) = (params.domain_identifier, params.identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("identifier", &identifier)
        .opt("assetScopes", params.asset_scopes)
        .opt("decisionComment", params.decision_comment)
        .build();

    send(&client, "AcceptSubscriptionRequest", input, |e| {
        format!("Error accepting subscription request {} in domain {}: {}", identifier, domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetSubscriptionParams {
    pub domain_identifier: String,
    /// The ID of the subscription
    pub identifier: String,
}

async fn get_subscription(client: ClientHandle, params: GetSubscriptionParams) -> std::result::Result<Value, ToolError> {
    let (domain, identifier) = (params.domain_identifier, params.identifier);
    let input = json!({"domainIdentifier": domain, "identifier": identifier});
    send(&client, "GetSubscription", input, |e| {
        format!("Error getting subscription {} in domain {}: {}", identifier, domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFormTypeParams {
    pub domain_identifier: String,
    pub form_type_identifier: String,
    #[serde(default)]
    pub revision: Option<String>,
}

async fn get_form_type(client: ClientHandle, params: GetFormTypeParams) -> std::result::Result<Value, ToolError> {
    let (domain, form_type) = (params.domain_identifier, params.form_type_identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("formTypeIdentifier", &form_type)
        .opt("revision", params.revision)
        .build();

    send(&client, "GetFormType", input, |e| {
        format!("Error getting form type {} in domain {}: {}", form_type, domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateFormTypeParams {
    pub domain_identifier: String,
    /// The name of the form type (1-128 characters)
    pub name: String,
    /// Form type model; a union where exactly one member is set, for example `{"smithy": "..."}`
    pub model: Value,
    /// The ID of the project that owns the form type
    pub owning_project_identifier: String,
    #[serde(default)]
    pub description: Option<String>,
    /// ENABLED or DISABLED
    #[serde(default = "enabled")]
    pub status: String,
}

async fn create_form_type(client: ClientHandle, params: CreateFormTypeParams) -> std::result::Result<Value, ToolError> {
    if !matches!(params.status.as_str(), "ENABLED" | "DISABLED") {
        return Err(ToolError::Validation(
            "status must be either 'ENABLED' or 'DISABLED'".to_string(),
        ));
    }

    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("name", params.name)
        .set("model", params.model)
        .set("owningProjectIdentifier", params.owning_project_identifier)
        .set("status", params.status)
        .opt("description", params.description)
        .build();

    send(&client, "CreateFormType", input, |e| {
        format!("Error creating form type in domain {}: {}", domain, e)
    })
    .await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListDataSourcesParams {
    pub domain_identifier: String,
    pub project_identifier: String,
    #[serde(default)]
    pub connection_identifier: Option<String>,
    #[serde(default)]
    pub environment_identifier: Option<String>,
    /// Maximum number of data sources to return (1-50)
    #[serde(default = "default_page_size")]
    pub max_results: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub next_token: Option<String>,
    /// CREATING, FAILED_CREATION, READY, UPDATING, FAILED_UPDATE, RUNNING,
    /// DELETING or FAILED_DELETION
    #[serde(default)]
    pub status: Option<String>,
    /// Filter by data source type, for example GLUE
    #[serde(default)]
    pub data_source_type: Option<String>,
}

async fn list_data_sources(client: ClientHandle, params: ListDataSourcesParams) -> std::result::Result<Value, ToolError> {
    let (domain, project) = (params.domain_identifier, params.project_identifier);
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("maxResults", params.max_results.min(MAX_PAGE_SIZE))
        .set("projectIdentifier", &project)
        .opt("nextToken", params.next_token)
        .opt("status", params.status)
        .opt("connectionIdentifier", params.connection_identifier)
        .opt("environmentIdentifier", params.environment_identifier)
        .opt("name", params.name)
        .opt("type", params.data_source_type)
        .build();

    send(&client, "ListDataSources", input, |e| {
        format!(
            "Error listing data sources in project {} in domain {}: {}",
            project, domain, e
        )
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{call, setup};
    use super::*;
    use crate::aws::testing::ScriptedAws;
    use crate::error::ErrorKind;

    fn api_error(code: &str, operation: &str) -> ServiceError {
        ServiceError::api(code, operation, "request rejected")
    }

    #[tokio::test]
    async fn test_get_asset_error_messages() {
        for (code, expected) in [
            ("AccessDeniedException", "Access denied while getting asset a1 in domain dzd_1".to_string()),
            ("ResourceNotFoundException", "Data asset a1 or domain dzd_1 not found".to_string()),
            ("ThrottlingException", "Request throttled while getting asset a1 in domain dzd_1".to_string()),
            (
                "SomethingNew",
                format!("Error getting asset a1 in domain dzd_1: {}", api_error("SomethingNew", "GetAsset")),
            ),
        ] {
            let (_, registry) = setup(ScriptedAws::new().fail(SERVICE, "GetAsset", api_error(code, "GetAsset")));
            let err = call(&registry, "get_asset", json!({"domain_identifier": "dzd_1", "asset_identifier": "a1"}))
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), expected);
            assert_eq!(err.kind(), ErrorKind::RemoteService);
        }
    }

    #[tokio::test]
    async fn test_create_asset_conflict_and_not_found() {
        let args = json!({
            "domain_identifier": "dzd_1",
            "name": "orders",
            "type_identifier": "amazon.datazone.GlueTableAssetType",
            "owning_project_identifier": "prj_1"
        });

        let (_, registry) = setup(ScriptedAws::new().fail(SERVICE, "CreateAsset", api_error("ConflictException", "CreateAsset")));
        let err = call(&registry, "create_asset", args.clone()).await.unwrap_err();
        assert_eq!(err.to_string(), "There is a conflict while creating asset in domain dzd_1");

        let (_, registry) = setup(ScriptedAws::new().fail(
            SERVICE,
            "CreateAsset",
            api_error("ResourceNotFoundException", "CreateAsset"),
        ));
        let err = call(&registry, "create_asset", args).await.unwrap_err();
        assert_eq!(err.to_string(), "Domain dzd_1 not found");
    }

    #[tokio::test]
    async fn test_start_data_source_run_error_messages() {
        for (code, expected) in [
            ("ConflictException", "Conflict while starting data source run for ds1 in domain dzd_1"),
            ("ResourceNotFoundException", "Data source ds1 or domain dzd_1 not found"),
            ("UnauthorizedException", "Unauthorized to start data source run for ds1 in domain dzd_1"),
            (
                "ServiceQuotaExceededException",
                "Service quota exceeded while starting data source run for ds1 in domain dzd_1",
            ),
        ] {
            let (_, registry) = setup(ScriptedAws::new().fail(
                SERVICE,
                "StartDataSourceRun",
                api_error(code, "StartDataSourceRun"),
            ));
            let err = call(
                &registry,
                "start_data_source_run",
                json!({"domain_identifier": "dzd_1", "data_source_identifier": "ds1"}),
            )
            .await
            .unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_create_data_source_request_shape() {
        let (api, registry) = setup(ScriptedAws::new().respond(SERVICE, "CreateDataSource", json!({"id": "ds1"})));
        call(
            &registry,
            "create_data_source",
            json!({
                "domain_identifier": "dzd_1",
                "project_identifier": "prj_1",
                "name": "glue-source",
                "data_src_type": "GLUE",
                "configuration": {"glueRunConfiguration": {"relationalFilterConfigurations": []}}
            }),
        )
        .await
        .unwrap();

        assert_eq!(
            api.calls_to("CreateDataSource")[0].input,
            json!({
                "domainIdentifier": "dzd_1",
                "projectIdentifier": "prj_1",
                "name": "glue-source",
                "type": "GLUE",
                "enableSetting": "ENABLED",
                "publishOnImport": false,
                "configuration": {"glueRunConfiguration": {"relationalFilterConfigurations": []}}
            })
        );
    }

    #[tokio::test]
    async fn test_create_form_type_rejects_status_before_calling() {
        let (api, registry) = setup(ScriptedAws::new());
        let err = call(
            &registry,
            "create_form_type",
            json!({
                "domain_identifier": "dzd_1",
                "name": "customer_profile",
                "model": {"smithy": "structure customer_profile {}"},
                "owning_project_identifier": "prj_1",
                "status": "ARCHIVED"
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "status must be either 'ENABLED' or 'DISABLED'");
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_calls_clamp_page_size() {
        let (api, registry) = setup(
            ScriptedAws::new()
                .respond(SERVICE, "SearchListings", json!({"items": []}))
                .respond(SERVICE, "ListDataSources", json!({"items": []})),
        );
        call(&registry, "search_listings", json!({"domain_identifier": "dzd_1", "max_results": 200, "search_text": "orders"}))
            .await
            .unwrap();
        call(
            &registry,
            "list_data_sources",
            json!({"domain_identifier": "dzd_1", "project_identifier": "prj_1", "max_results": 75, "data_source_type": "GLUE"}),
        )
        .await
        .unwrap();

        assert_eq!(
            api.calls_to("SearchListings")[0].input,
            json!({"domainIdentifier": "dzd_1", "maxResults": 50, "searchText": "orders"})
        );
        assert_eq!(
            api.calls_to("ListDataSources")[0].input,
            json!({"domainIdentifier": "dzd_1", "maxResults": 50, "projectIdentifier": "prj_1", "type": "GLUE"})
        );
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let registry = ToolRegistry::new();
        super::super::register(&registry, ClientHandle::not_configured("no usable AWS credentials")).unwrap();
        let err = call(&registry, "get_subscription", json!({"domain_identifier": "dzd_1", "identifier": "sub_1"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ClientConfiguration);
        assert_eq!(err.to_string(), "DataZone client not initialized: no usable AWS credentials");
    }
}
