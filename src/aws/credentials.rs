//! Credential resolution.
//!
//! The provider walks a fixed policy: environment credentials in local
//! development, then the Secrets Manager secret, then the ambient chain of
//! the AWS CLI. It never fails. When nothing usable is found the result is
//! [`ClientHandle::NotConfigured`] and the tools report it per call.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use super::cli::AwsCli;
use super::{ApiRequest, AwsApi, ClientHandle, ServiceError};
use crate::config::AwsSettings;

/// Secrets Manager is always read in this region.
const SECRETS_REGION: &str = "us-east-1";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    SecretsManager,
    Ambient,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Environment => "environment",
            Self::SecretsManager => "secrets manager",
            Self::Ambient => "default chain",
        })
    }
}

/// The session the provider settled on.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub source: CredentialSource,
    /// `None` for the ambient chain.
    pub credentials: Option<Credentials>,
    pub region: String,
    pub expected_account: Option<String>,
}

#[derive(Deserialize)]
struct SecretPayload {
    #[serde(rename = "AWS_ACCESS_KEY_ID")]
    access_key_id: String,
    #[serde(rename = "AWS_SECRET_ACCESS_KEY")]
    secret_access_key: String,
    #[serde(rename = "AWS_SESSION_TOKEN", default)]
    session_token: Option<String>,
    #[serde(rename = "AWS_DEFAULT_REGION", default)]
    region: Option<String>,
    #[serde(rename = "ACCOUNT_ID", default)]
    account_id: Option<String>,
}

/// Resolves the process-wide [`ClientHandle`].
///
/// `connect` builds a client for optional explicit credentials and a region.
/// Production code passes [`cli_connector`]; tests pass scripted clients.
pub struct CredentialProvider<F> {
    settings: AwsSettings,
    connect: F,
}

impl<F> CredentialProvider<F>
where
    F: Fn(Option<&Credentials>, &str) -> Arc<dyn AwsApi>,
{
    pub fn new(settings: AwsSettings, connect: F) -> Self {
        Self { settings, connect }
    }

    pub async fn resolve(&self) -> ClientHandle {
        let session = self.select_session().await;
        let api = (self.connect)(session.credentials.as_ref(), &session.region);

        match caller_account(api.as_ref()).await {
            Ok((account, arn)) => {
                tracing::info!(%account, %arn, source = %session.source, "Verified AWS credentials");
                if let Some(expected) = &session.expected_account {
                    if expected != &account {
                        tracing::warn!(%expected, actual = %account, "AWS account mismatch");
                    }
                }
                ClientHandle::Ready(api)
            }
            Err(e) if session.source == CredentialSource::Ambient => {
                tracing::error!(error = %e, "Cannot verify default AWS credentials");
                ClientHandle::not_configured(format!("no usable AWS credentials: {}", e))
            }
            Err(e) => {
                // Explicit credentials are kept; a failed check is only reported.
                tracing::error!(error = %e, source = %session.source, "Cannot verify AWS credentials");
                ClientHandle::Ready(api)
            }
        }
    }

    async fn select_session(&self) -> Session {
        if self.settings.local_dev {
            if let Some(credentials) = &self.settings.env_credentials {
                tracing::info!("Using AWS credentials from environment variables (local development)");
                return Session {
                    source: CredentialSource::Environment,
                    credentials: Some(credentials.clone()),
                    region: self.settings.region.clone(),
                    expected_account: self.settings.account_id.clone(),
                };
            }
        }

        tracing::info!(secret = %self.settings.secret_name, "Retrieving AWS credentials from Secrets Manager");
        match self.from_secret().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Falling back to default AWS credentials");
                Session {
                    source: CredentialSource::Ambient,
                    credentials: None,
                    region: self.settings.region.clone(),
                    expected_account: self.settings.account_id.clone(),
                }
            }
        }
    }

    async fn from_secret(&self) -> Result<Session, ServiceError> {
        let secrets = (self.connect)(None, SECRETS_REGION);
        let response = secrets
            .call(ApiRequest::new(
                "secretsmanager",
                "GetSecretValue",
                json!({ "SecretId": self.settings.secret_name }),
            ))
            .await?;
        let secret_string = response
            .get("SecretString")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ServiceError::Transport("secret has no SecretString".to_string()))?;
        let payload: SecretPayload = serde_json::from_str(secret_string)
            .map_err(|e| ServiceError::Transport(format!("malformed credentials secret: {}", e)))?;

        tracing::info!(
            account = payload.account_id.as_deref().unwrap_or("unknown"),
            "Retrieved AWS credentials from Secrets Manager"
        );
        Ok(Session {
            source: CredentialSource::SecretsManager,
            credentials: Some(Credentials::new(
                payload.access_key_id,
                payload.secret_access_key,
                payload.session_token,
            )),
            region: payload.region.unwrap_or_else(|| self.settings.region.clone()),
            expected_account: payload.account_id,
        })
    }
}

async fn caller_account(api: &dyn AwsApi) -> Result<(String, String), ServiceError> {
    let identity = api
        .call(ApiRequest::new("sts", "GetCallerIdentity", json!({})))
        .await?;
    let field = |name: &str| {
        identity
            .get(name)
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    };
    Ok((field("Account"), field("Arn")))
}

/// Connector building [`AwsCli`] clients around one executable.
pub fn cli_connector(program: String) -> impl Fn(Option<&Credentials>, &str) -> Arc<dyn AwsApi> {
    move |credentials: Option<&Credentials>, region: &str| -> Arc<dyn AwsApi> {
        Arc::new(AwsCli::new(program.clone(), region, credentials.cloned()))
    }
}

/// Runs the credential policy against the AWS CLI.
pub async fn resolve_client(settings: &AwsSettings) -> ClientHandle {
    let connect = cli_connector(settings.cli_path.clone());
    CredentialProvider::new(settings.clone(), connect).resolve().await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::aws::testing::ScriptedAws;
    use crate::error::ErrorKind;

    fn identity(account: &str) -> serde_json::Value {
        json!({"Account": account, "Arn": format!("arn:aws:iam::{account}:user/mcp"), "UserId": "AID"})
    }

    fn secret(region: &str) -> serde_json::Value {
        let payload = json!({
            "AWS_ACCESS_KEY_ID": "ASIASECRET",
            "AWS_SECRET_ACCESS_KEY": "s3cr3t",
            "AWS_SESSION_TOKEN": "tok",
            "AWS_DEFAULT_REGION": region,
            "ACCOUNT_ID": "111111111111"
        });
        json!({ "SecretString": payload.to_string() })
    }

    /// Hands out `api` and records what every connect call asked for.
    struct Recorder {
        api: Arc<ScriptedAws>,
        connects: Mutex<Vec<(Option<Credentials>, String)>>,
    }

    impl Recorder {
        fn new(api: ScriptedAws) -> Arc<Self> {
            Arc::new(Self {
                api: Arc::new(api),
                connects: Mutex::new(Vec::new()),
            })
        }

        fn connector(self: &Arc<Self>) -> impl Fn(Option<&Credentials>, &str) -> Arc<dyn AwsApi> {
            let recorder = self.clone();
            move |credentials: Option<&Credentials>, region: &str| -> Arc<dyn AwsApi> {
                recorder
                    .connects
                    .lock()
                    .unwrap()
                    .push((credentials.cloned(), region.to_string()));
                recorder.api.clone()
            }
        }
    }

    #[tokio::test]
    async fn test_local_dev_uses_environment_credentials() {
        let recorder = Recorder::new(ScriptedAws::new().respond("sts", "GetCallerIdentity", identity("222")));
        let env = Credentials::new("ASIAENV", "env-secret", Some("env-token".into()));
        let settings = AwsSettings {
            local_dev: true,
            env_credentials: Some(env.clone()),
            region: "eu-west-1".into(),
            ..Default::default()
        };

        let handle = CredentialProvider::new(settings, recorder.connector()).resolve().await;

        assert!(handle.is_ready());
        assert!(recorder.api.calls_to("GetSecretValue").is_empty());
        let connects = recorder.connects.lock().unwrap();
        assert_eq!(connects.as_slice(), [(Some(env), "eu-west-1".to_string())]);
    }

    #[tokio::test]
    async fn test_secret_is_used_without_local_dev() {
        let recorder = Recorder::new(
            ScriptedAws::new()
                .respond("secretsmanager", "GetSecretValue", secret("us-west-2"))
                .respond("sts", "GetCallerIdentity", identity("999")),
        );
        let settings = AwsSettings {
            env_credentials: Some(Credentials::new("ASIAENV", "x", Some("y".into()))),
            ..Default::default()
        };

        let handle = CredentialProvider::new(settings, recorder.connector()).resolve().await;

        // Account mismatch is only a warning.
        assert!(handle.is_ready());
        let calls = recorder.api.calls_to("GetSecretValue");
        assert_eq!(calls[0].input["SecretId"], crate::config::DEFAULT_SECRET_NAME);
        let connects = recorder.connects.lock().unwrap();
        assert_eq!(connects[0], (None, "us-east-1".to_string()));
        let (credentials, region) = &connects[1];
        assert_eq!(credentials.as_ref().map(|c| c.access_key_id.as_str()), Some("ASIASECRET"));
        assert_eq!(region, "us-west-2");
    }

    #[tokio::test]
    async fn test_falls_back_to_ambient_credentials() {
        let recorder = Recorder::new(
            ScriptedAws::new()
                .fail(
                    "secretsmanager",
                    "GetSecretValue",
                    ServiceError::api("ResourceNotFoundException", "GetSecretValue", "not found"),
                )
                .respond("sts", "GetCallerIdentity", identity("333")),
        );

        let handle = CredentialProvider::new(AwsSettings::default(), recorder.connector())
            .resolve()
            .await;

        assert!(handle.is_ready());
        let connects = recorder.connects.lock().unwrap();
        assert_eq!(connects.last().unwrap(), &(None, "us-east-1".to_string()));
    }

    #[tokio::test]
    async fn test_unverifiable_ambient_credentials_are_not_configured() {
        let recorder = Recorder::new(ScriptedAws::new().fail(
            "sts",
            "GetCallerIdentity",
            ServiceError::Transport("Unable to locate credentials".into()),
        ));

        let handle = CredentialProvider::new(AwsSettings::default(), recorder.connector())
            .resolve()
            .await;

        assert!(!handle.is_ready());
        let err = handle.api("S3").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::ClientConfiguration);
        assert!(err.to_string().contains("Unable to locate credentials"));
    }

    #[tokio::test]
    async fn test_malformed_secret_falls_back() {
        let recorder = Recorder::new(
            ScriptedAws::new()
                .respond("secretsmanager", "GetSecretValue", json!({"SecretString": "{not json"}))
                .respond("sts", "GetCallerIdentity", identity("444")),
        );

        let provider = CredentialProvider::new(AwsSettings::default(), recorder.connector());
        let session = provider.select_session().await;
        assert_eq!(session.source, CredentialSource::Ambient);
        assert!(session.credentials.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::new("AKIA", "very-secret", Some("token".into())));
        assert!(rendered.contains("AKIA"));
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("\"token\""));
    }
}
