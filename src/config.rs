use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::aws::credentials::Credentials;
use crate::service::Service;

pub const DEFAULT_SECRET_NAME: &str = "datazone-mcp-server/aws-credentials";
pub const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_CLI_PATH: &str = "aws";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Unsupported MCP_TRANSPORT '{0}', expected 'stdio' or 'http'")]
    InvalidTransport(String),

    #[error("Invalid PORT '{0}'")]
    InvalidPort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Stdio,
    Http,
}

impl Transport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "http" => Ok(Self::Http),
            _ => Err(ConfigError::InvalidTransport(s.to_string())),
        }
    }
}

/// Settings consumed by the credential provider and the AWS CLI backend.
#[derive(Debug, Clone, PartialEq)]
pub struct AwsSettings {
    /// `MCP_LOCAL_DEV=true`: prefer credentials taken from the environment.
    pub local_dev: bool,
    /// Complete key/secret/token triple found in the environment, if any.
    pub env_credentials: Option<Credentials>,
    pub secret_name: String,
    pub region: String,
    pub account_id: Option<String>,
    pub cli_path: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            local_dev: false,
            env_credentials: None,
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            region: DEFAULT_REGION.to_string(),
            account_id: None,
            cli_path: DEFAULT_CLI_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub service: Service,
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub aws: AwsSettings,
}

impl ServerConfig {
    pub fn from_env(service: Service) -> Result<Self, ConfigError> {
        Self::from_lookup(service, |key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(service: Service, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let transport = match get("MCP_TRANSPORT") {
            Some(value) => value.parse()?,
            None => Transport::default(),
        };
        let port = match get("PORT") {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(value.clone()))?,
            None => service.default_port(),
        };

        let env_credentials = match (
            get("AWS_ACCESS_KEY_ID"),
            get("AWS_SECRET_ACCESS_KEY"),
            get("AWS_SESSION_TOKEN"),
        ) {
            (Some(access_key_id), Some(secret_access_key), Some(session_token)) => {
                Some(Credentials::new(access_key_id, secret_access_key, Some(session_token)))
            }
            _ => None,
        };

        let aws = AwsSettings {
            local_dev: get("MCP_LOCAL_DEV").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            env_credentials,
            secret_name: get("AWS_SECRET_NAME").unwrap_or_else(|| DEFAULT_SECRET_NAME.to_string()),
            region: get("AWS_DEFAULT_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            account_id: get("AWS_ACCOUNT_ID"),
            cli_path: get("AWS_CLI_PATH").unwrap_or_else(|| DEFAULT_CLI_PATH.to_string()),
        };

        Ok(Self {
            service,
            transport,
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            aws,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(service: Service, vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(service, |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(Service::Athena, &[]).unwrap();
        assert_eq!(config.transport, Transport::Stdio);
        assert_eq!(config.bind_address(), "0.0.0.0:8082");
        assert_eq!(config.aws, AwsSettings::default());
    }

    #[test]
    fn test_http_transport_and_overrides() {
        let config = config(
            Service::Glue,
            &[("MCP_TRANSPORT", "HTTP"), ("HOST", "127.0.0.1"), ("PORT", "9000")],
        )
        .unwrap();
        assert_eq!(config.transport, Transport::Http);
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert_eq!(
            config(Service::S3, &[("MCP_TRANSPORT", "sse")]).unwrap_err(),
            ConfigError::InvalidTransport("sse".to_string())
        );
        assert_eq!(
            config(Service::S3, &[("PORT", "eighty")]).unwrap_err(),
            ConfigError::InvalidPort("eighty".to_string())
        );
        assert!(config(Service::S3, &[("PORT", "70000")]).is_err());
    }

    #[test]
    fn test_env_credentials_need_all_three_parts() {
        let partial = config(
            Service::DataZone,
            &[("AWS_ACCESS_KEY_ID", "AKIA"), ("AWS_SECRET_ACCESS_KEY", "secret")],
        )
        .unwrap();
        assert!(partial.aws.env_credentials.is_none());

        let full = config(
            Service::DataZone,
            &[
                ("MCP_LOCAL_DEV", "True"),
                ("AWS_ACCESS_KEY_ID", "ASIA"),
                ("AWS_SECRET_ACCESS_KEY", "secret"),
                ("AWS_SESSION_TOKEN", "token"),
                ("AWS_DEFAULT_REGION", "eu-central-1"),
                ("AWS_SECRET_NAME", "custom/secret"),
            ],
        )
        .unwrap();
        assert!(full.aws.local_dev);
        assert_eq!(
            full.aws.env_credentials,
            Some(Credentials::new("ASIA", "secret", Some("token".to_string())))
        );
        assert_eq!(full.aws.region, "eu-central-1");
        assert_eq!(full.aws.secret_name, "custom/secret");
    }
}
