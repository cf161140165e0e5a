use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::{default_page_size, LABEL, MAX_PAGE_SIZE, SERVICE};
use crate::aws::{ApiRequest, ClientHandle};
use crate::error::{Result, ToolError};
use crate::registry::ToolRegistry;
use crate::tools::{remote_failure, Input};

pub fn register(registry: &ToolRegistry, client: ClientHandle) -> Result<()> {
    registry.register_tool(
        "create_project",
        "Creates a new project in an AWS DataZone domain.",
        client.clone(),
        create_project,
    )?;
    registry.register_tool(
        "get_project",
        "Retrieves detailed information about a specific project in Amazon DataZone.",
        client.clone(),
        get_project,
    )?;
    registry.register_tool(
        "list_projects",
        "Lists projects in an AWS DataZone domain with optional filtering and pagination.",
        client,
        list_projects,
    )?;
    Ok(())
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateProjectParams {
    /// The ID of the domain where the project will be created
    pub domain_identifier: String,
    /// The name of the project
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// The ID of the domain unit where the project will be created
    #[serde(default)]
    pub domain_unit_id: Option<String>,
    /// Glossary terms that can be used in the project
    #[serde(default)]
    pub glossary_terms: Option<Vec<String>>,
    #[serde(default)]
    pub project_profile_id: Option<String>,
    #[serde(default)]
    pub user_parameters: Option<Vec<Value>>,
}

async fn create_project(client: ClientHandle, params: CreateProjectParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("name", params.name)
        .set("description", params.description)
        .opt("domainUnitId", params.domain_unit_id)
        .opt("glossaryTerms", params.glossary_terms)
        .opt("projectProfileId", params.project_profile_id)
        .opt("userParameters", params.user_parameters)
        .build();

    api.call(ApiRequest::new(SERVICE, "CreateProject", input))
        .await
        .map_err(|e| {
            remote_failure(
                "create_project",
                &e,
                format!("Error creating project in domain {}: {}", domain, e),
            )
        })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetProjectParams {
    /// The ID of the domain containing the project
    pub domain_identifier: String,
    /// The ID of the project to retrieve
    pub project_identifier: String,
}

async fn get_project(client: ClientHandle, params: GetProjectParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let (domain, project) = (params.domain_identifier, params.project_identifier);
    let input = serde_json::json!({"domainIdentifier": domain, "identifier": project});

    api.call(ApiRequest::new(SERVICE, "GetProject", input))
        .await
        .map_err(|e| {
            remote_failure(
                "get_project",
                &e,
                format!("Error getting project {} in domain {}: {}", project, domain, e),
            )
        })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListProjectsParams {
    pub domain_identifier: String,
    /// Maximum number of projects to return (1-50)
    #[serde(default = "default_page_size")]
    pub max_results: u32,
    /// Token for pagination
    #[serde(default)]
    pub next_token: Option<String>,
    /// Filter projects by name
    #[serde(default)]
    pub name: Option<String>,
    /// Filter projects by user
    #[serde(default)]
    pub user_identifier: Option<String>,
    /// Filter projects by group
    #[serde(default)]
    pub group_identifier: Option<String>,
}

async fn list_projects(client: ClientHandle, params: ListProjectsParams) -> std::result::Result<Value, ToolError> {
    let api = client.api(LABEL)?;
    let domain = params.domain_identifier;
    let input = Input::new()
        .set("domainIdentifier", &domain)
        .set("maxResults", params.max_results.min(MAX_PAGE_SIZE))
        .opt("nextToken", params.next_token)
        .opt("name", params.name)
        .opt("userIdentifier", params.user_identifier)
        .opt("groupIdentifier", params.group_identifier)
        .build();

    api.call(ApiRequest::new(SERVICE, "ListProjects", input))
        .await
        .map_err(|e| remote_failure("list_projects", &e, format!("Error listing projects in domain {}: {}", domain, e)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{call, setup};
    use super::*;
    use crate::aws::testing::ScriptedAws;
    use crate::aws::ServiceError;

    #[tokio::test]
    async fn test_create_project_sends_only_given_optionals() {
        let (api, registry) = setup(ScriptedAws::new().respond(SERVICE, "CreateProject", json!({"id": "prj_1"})));

        let result = call(
            &registry,
            "create_project",
            json!({"domain_identifier": "dzd_1", "name": "Sales", "glossary_terms": ["revenue"]}),
        )
        .await
        .unwrap();

        assert_eq!(result, json!({"id": "prj_1"}));
        assert_eq!(
            api.calls_to("CreateProject")[0].input,
            json!({"domainIdentifier": "dzd_1", "name": "Sales", "description": "", "glossaryTerms": ["revenue"]})
        );
    }

    #[tokio::test]
    async fn test_list_projects_clamps_page_size() {
        let (api, registry) = setup(ScriptedAws::new().respond(SERVICE, "ListProjects", json!({"items": []})));
        call(&registry, "list_projects", json!({"domain_identifier": "dzd_1", "max_results": 500}))
            .await
            .unwrap();
        call(&registry, "list_projects", json!({"domain_identifier": "dzd_1", "max_results": 10, "name": "Sales"}))
            .await
            .unwrap();

        let calls = api.calls_to("ListProjects");
        assert_eq!(calls[0].input, json!({"domainIdentifier": "dzd_1", "maxResults": 50}));
        assert_eq!(calls[1].input, json!({"domainIdentifier": "dzd_1", "maxResults": 10, "name": "Sales"}));
    }

    #[tokio::test]
    async fn test_get_project_error_keeps_remote_text() {
        let err = ServiceError::api("ResourceNotFoundException", "GetProject", "Project prj_9 not found");
        let (_, registry) = setup(ScriptedAws::new().fail(SERVICE, "GetProject", err.clone()));

        let result = call(&registry, "get_project", json!({"domain_identifier": "dzd_1", "project_identifier": "prj_9"}))
            .await
            .unwrap_err();
        assert_eq!(
            result.to_string(),
            format!("Error getting project prj_9 in domain dzd_1: {}", err)
        );
    }
}
