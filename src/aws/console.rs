use anyhow::{Context, bail};
use reqwest::Client;
use serde::Serialize;
use std::process::Command;
use tracing::{debug, info};
use url::Url;

use super::Credentials;
use crate::{
    constants::{CONSOLE_DESTINATION, FEDERATION_ENDPOINT},
    error::{GasyError, Result},
};

// AWS Federation API types (internal use only)
// These types match the exact JSON format expected by AWS federation endpoint

/// Session credentials format for AWS federation getSigninToken API
#[derive(Debug, Serialize)]
struct SessionCredentials<'a> {
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    #[serde(rename = "sessionKey")]
    session_key: &'a str,
    #[serde(rename = "sessionToken")]
    session_token: &'a str,
}

/// Client for the two-step console federation handshake
#[derive(Debug, Clone)]
pub struct FederationClient {
    endpoint: Url,
    destination: String,
    http: Client,
}

impl FederationClient {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(FEDERATION_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            GasyError::federation_request(format!("invalid federation endpoint {endpoint}: {e}"))
        })?;

        Ok(Self {
            endpoint,
            destination: CONSOLE_DESTINATION.to_string(),
            http: Client::new(),
        })
    }

    /// Exchange `creds` for a sign-in token and build the console login URL.
    /// Nothing is retried: a fresh call always starts from the token request.
    pub async fn console_url(&self, creds: &Credentials) -> Result<Url> {
        let signin_token = self.signin_token(creds).await?;
        Ok(self.login_url(&signin_token))
    }

    /// Get signin token from AWS federation endpoint
    pub async fn signin_token(&self, creds: &Credentials) -> Result<String> {
        let session = SessionCredentials {
            session_id: &creds.access_key_id,
            session_key: &creds.secret_access_key,
            session_token: &creds.session_token,
        };
        let session_json = serde_json::to_string(&session)
            .map_err(|e| GasyError::federation_request(format!("cannot encode session: {e}")))?;

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("Action", "getSigninToken")
            .append_pair("Session", &session_json);

        info!("Requesting console sign-in token");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GasyError::federation_request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GasyError::federation_request(format!(
                "federation endpoint returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| GasyError::federation_request(e.to_string()))?;

        parse_signin_token(&body)
    }

    /// Login URL with parameters in the order Action, Destination, SigninToken
    pub fn login_url(&self, signin_token: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("Action", "login")
            .append_pair("Destination", &self.destination)
            .append_pair("SigninToken", signin_token);
        url
    }
}

/// Extract `SigninToken` from a getSigninToken response body
fn parse_signin_token(body: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| GasyError::federation_decode(format!("body is not JSON: {e}")))?;

    let object = value
        .as_object()
        .ok_or_else(|| GasyError::federation_decode("body is not a JSON object"))?;

    match object.get("SigninToken").and_then(|t| t.as_str()) {
        Some(token) if !token.is_empty() => {
            debug!("Received sign-in token");
            Ok(token.to_string())
        }
        _ => Err(GasyError::federation_decode(
            "SigninToken missing or not a string",
        )),
    }
}

/// Open URL in browser using platform-specific command
pub fn open_browser(url: &str) -> anyhow::Result<()> {
    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg(url).status();

    #[cfg(target_os = "windows")]
    let status = Command::new("cmd").args(["/c", "start", "", url]).status();

    #[cfg(target_os = "linux")]
    let status = Command::new("xdg-open").arg(url).status();

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    bail!("Unsupported operating system");

    #[cfg(any(target_os = "macos", target_os = "windows", target_os = "linux"))]
    {
        let status = status.context("Failed to execute browser command")?;
        if !status.success() {
            bail!("Browser command returned error: {status}");
        }
        Ok(())
    }
}
