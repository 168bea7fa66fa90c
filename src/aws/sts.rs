use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sts::{Client as StsClient, error::DisplayErrorContext};
use std::env;
use tracing::{debug, info};

use super::Credentials;
use crate::{
    account::Account,
    constants::{APP_TAG, AWS_PARTITION, SESSION_DURATION_SECONDS},
    error::{GasyError, Result},
};

/// AWS limit on RoleSessionName length
const MAX_SESSION_NAME_LEN: usize = 64;

/// Parameters of a single sts:AssumeRole call
#[derive(Clone, PartialEq, Eq)]
pub struct AssumeRequest {
    pub role_arn: String,
    pub session_name: String,
    pub duration_seconds: i32,
    pub serial_number: String,
    pub token_code: String,
    pub external_id: Option<String>,
}

impl AssumeRequest {
    pub fn new(
        account: &Account,
        role_name: &str,
        serial_number: &str,
        token_code: &str,
        username: &str,
    ) -> Self {
        Self {
            role_arn: role_arn(&account.id, role_name),
            session_name: session_name(username),
            duration_seconds: SESSION_DURATION_SECONDS,
            serial_number: serial_number.to_string(),
            token_code: token_code.to_string(),
            external_id: account.external_id.clone(),
        }
    }
}

impl std::fmt::Debug for AssumeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumeRequest")
            .field("role_arn", &self.role_arn)
            .field("session_name", &self.session_name)
            .field("duration_seconds", &self.duration_seconds)
            .field("serial_number", &self.serial_number)
            .field("token_code", &"***")
            .field("external_id", &self.external_id.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Exchanges an [`AssumeRequest`] for temporary credentials
#[async_trait]
pub trait AssumeRole {
    async fn assume_role(&self, request: &AssumeRequest) -> Result<Credentials>;
}

/// Calls AWS STS, signing with the long-lived credentials of `source_profile`
#[derive(Debug, Clone)]
pub struct StsRoleAssumer {
    pub region: String,
    pub source_profile: String,
}

impl StsRoleAssumer {
    pub fn new(region: impl Into<String>, source_profile: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            source_profile: source_profile.into(),
        }
    }
}

#[async_trait]
impl AssumeRole for StsRoleAssumer {
    async fn assume_role(&self, request: &AssumeRequest) -> Result<Credentials> {
        info!("Calling AWS STS AssumeRole");
        debug!("Source profile: {}", self.source_profile);
        debug!("Region: {}", self.region);
        debug!("Request: {:?}", request);

        let config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(&self.source_profile)
            .region(Region::new(self.region.clone()))
            .load()
            .await;

        let client = StsClient::new(&config);

        let response = client
            .assume_role()
            .role_arn(&request.role_arn)
            .role_session_name(&request.session_name)
            .duration_seconds(request.duration_seconds)
            .serial_number(&request.serial_number)
            .token_code(&request.token_code)
            .set_external_id(request.external_id.clone())
            .send()
            .await
            .map_err(|e| {
                GasyError::assumption(&request.role_arn, DisplayErrorContext(&e).to_string())
            })?;

        let sts_creds = response.credentials().ok_or_else(|| {
            GasyError::assumption(&request.role_arn, "AWS STS returned no credentials")
        })?;

        let credentials = Credentials {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            expiration: *sts_creds.expiration(),
        };

        info!("Successfully obtained AWS credentials");
        Ok(credentials)
    }
}

pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:{AWS_PARTITION}:iam::{account_id}:role/{role_name}")
}

/// `gasy<username>`, restricted to the characters STS accepts in a session name
pub fn session_name(username: &str) -> String {
    let sanitized: String = username
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c,
            '_' | '+' | '=' | ',' | '.' | '@' | '-' => c,
            _ => '-',
        })
        .collect();

    format!("{APP_TAG}{sanitized}")
        .chars()
        .take(MAX_SESSION_NAME_LEN)
        .collect()
}

/// Login name of the operator running the tool, from the system user
/// database with the usual environment variables as fallback
pub fn current_username() -> Result<String> {
    resolve_username(whoami::fallible::username().ok())
}

fn resolve_username(os_username: Option<String>) -> Result<String> {
    os_username
        .into_iter()
        .chain(
            ["USER", "USERNAME", "LOGNAME"]
                .iter()
                .filter_map(|key| env::var(key).ok()),
        )
        .find(|name| !name.trim().is_empty())
        .ok_or_else(|| GasyError::input_resolution("could not determine the local username"))
}
