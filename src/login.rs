//! The login pipeline: OTP, role assumption, profile write, console URL.
//!
//! Every stage runs only after the previous one succeeded, and the first
//! failure ends the run.

use colored::Colorize;
use tracing::{info, instrument};
use url::Url;

use crate::{
    account::Account,
    aws::{
        AssumeRequest, AssumeRole, console::FederationClient, credentials::CredentialStore,
    },
    config::LoginSettings,
    error::Result,
    otp::OtpSource,
};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Profile the credentials were written to
    pub profile: String,
    pub expiration: String,
    pub console_url: Url,
}

pub struct Login<A> {
    assumer: A,
    store: CredentialStore,
    federation: FederationClient,
    username: String,
}

impl<A: AssumeRole + Send + Sync> Login<A> {
    pub fn new(
        assumer: A,
        store: CredentialStore,
        federation: FederationClient,
        username: impl Into<String>,
    ) -> Self {
        Self {
            assumer,
            store,
            federation,
            username: username.into(),
        }
    }

    #[instrument(skip_all, fields(account = %account.name, role = %settings.role_name))]
    pub async fn run(
        &self,
        account: &Account,
        settings: &LoginSettings,
        otp: &OtpSource,
    ) -> Result<LoginOutcome> {
        let code = otp.obtain().await?;
        println!(
            "{}",
            format!("requesting credentials for {}", account.name)
                .green()
                .bold()
        );

        let request = AssumeRequest::new(
            account,
            &settings.role_name,
            &settings.mfa_serial,
            &code,
            &self.username,
        );
        info!("Requesting credentials for {}", account.name);
        let credentials = self.assumer.assume_role(&request).await?;

        self.store.save(&account.name, &credentials).await?;

        let console_url = self.federation.console_url(&credentials).await?;

        Ok(LoginOutcome {
            profile: account.name.clone(),
            expiration: credentials.expiration_string(),
            console_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aws::Credentials, error::GasyError};
    use async_trait::async_trait;
    use aws_smithy_types::DateTime;
    use ini::Ini;
    use serial_test::serial;
    use std::{env, sync::Mutex};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path, query_param},
    };

    #[derive(Default)]
    struct FakeAssumer {
        fail_with: Option<String>,
        requests: Mutex<Vec<AssumeRequest>>,
    }

    #[async_trait]
    impl AssumeRole for FakeAssumer {
        async fn assume_role(&self, request: &AssumeRequest) -> Result<Credentials> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.fail_with {
                Some(message) => Err(GasyError::assumption(&request.role_arn, message)),
                None => Ok(Credentials {
                    access_key_id: "ASIATEMP".to_string(),
                    secret_access_key: "tempsecret".to_string(),
                    session_token: "temptoken".to_string(),
                    expiration: DateTime::from_secs(1_700_000_000),
                }),
            }
        }
    }

    fn dev_account() -> Account {
        Account {
            id: "111122223333".to_string(),
            name: "dev".to_string(),
            external_id: None,
            description: "Dev".to_string(),
        }
    }

    fn settings() -> LoginSettings {
        LoginSettings {
            region: "eu-west-1".to_string(),
            source_profile: "default".to_string(),
            mfa_serial: "arn:aws:iam::999999999999:mfa/jane".to_string(),
            role_name: "Deployer".to_string(),
        }
    }

    async fn federation_server(expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/federation"))
            .and(query_param("Action", "getSigninToken"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"SigninToken":"abc123"}"#))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    fn login(
        assumer: FakeAssumer,
        store: CredentialStore,
        server: &MockServer,
    ) -> Login<FakeAssumer> {
        let federation =
            FederationClient::with_endpoint(&format!("{}/federation", server.uri())).unwrap();
        Login::new(assumer, store, federation, "jane")
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let tmp = tempfile::tempdir().unwrap();
        let store_path = tmp.path().join("credentials");
        let server = federation_server(1).await;
        let login = login(
            FakeAssumer::default(),
            CredentialStore::new(&store_path),
            &server,
        );

        let outcome = login
            .run(
                &dev_account(),
                &settings(),
                &OtpSource::Manual("123456".to_string()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.profile, "dev");
        assert_eq!(outcome.expiration, "2023-11-14T22:13:20Z");
        assert!(
            outcome
                .console_url
                .as_str()
                .ends_with("Action=login&Destination=https%3A%2F%2Fconsole.aws.amazon.com%2F&SigninToken=abc123")
        );

        let requests = login.assumer.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].role_arn, "arn:aws:iam::111122223333:role/Deployer");
        assert_eq!(requests[0].session_name, "gasyjane");
        assert_eq!(requests[0].token_code, "123456");
        assert_eq!(requests[0].external_id, None);

        let ini = Ini::load_from_file(&store_path).unwrap();
        let dev = ini.section(Some("dev")).unwrap();
        assert_eq!(dev.get("aws_access_key_id"), Some("ASIATEMP"));
        assert_eq!(dev.get("expiration"), Some("2023-11-14T22:13:20Z"));
    }

    #[tokio::test]
    async fn test_external_id_forwarded() {
        let tmp = tempfile::tempdir().unwrap();
        let server = federation_server(1).await;
        let login = login(
            FakeAssumer::default(),
            CredentialStore::new(tmp.path().join("credentials")),
            &server,
        );
        let account = Account {
            external_id: Some("s3cr3t".to_string()),
            ..dev_account()
        };

        login
            .run(
                &account,
                &settings(),
                &OtpSource::Manual("123456".to_string()),
            )
            .await
            .unwrap();

        let requests = login.assumer.requests.lock().unwrap();
        assert_eq!(requests[0].external_id.as_deref(), Some("s3cr3t"));
    }

    #[tokio::test]
    async fn test_assumption_failure_stops_pipeline() {
        let tmp = tempfile::tempdir().unwrap();
        let store_path = tmp.path().join("credentials");
        let server = federation_server(0).await;
        let login = login(
            FakeAssumer {
                fail_with: Some("MultiFactorAuthentication failed".to_string()),
                ..Default::default()
            },
            CredentialStore::new(&store_path),
            &server,
        );

        let err = login
            .run(
                &dev_account(),
                &settings(),
                &OtpSource::Manual("123456".to_string()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GasyError::Assumption { .. }));
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn test_invalid_code_never_reaches_sts() {
        let tmp = tempfile::tempdir().unwrap();
        let server = federation_server(0).await;
        let login = login(
            FakeAssumer::default(),
            CredentialStore::new(tmp.path().join("credentials")),
            &server,
        );

        let err = login
            .run(&dev_account(), &settings(), &OtpSource::Manual(String::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, GasyError::Otp { .. }));
        assert!(login.assumer.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_yubikey_failure_never_reaches_sts() {
        let tmp = tempfile::tempdir().unwrap();
        let store_path = tmp.path().join("credentials");
        let server = federation_server(0).await;
        let login = login(
            FakeAssumer::default(),
            CredentialStore::new(&store_path),
            &server,
        );
        let original = env::var("PATH").ok();
        unsafe {
            env::set_var("PATH", tmp.path());
        }

        let result = login
            .run(
                &dev_account(),
                &settings(),
                &OtpSource::YubiKey {
                    slot: "aws:mfa".to_string(),
                },
            )
            .await;

        unsafe {
            match original {
                Some(val) => env::set_var("PATH", val),
                None => env::remove_var("PATH"),
            }
        }
        assert!(matches!(result.unwrap_err(), GasyError::Otp { .. }));
        assert!(login.assumer.requests.lock().unwrap().is_empty());
        assert!(!store_path.exists());
    }

    #[tokio::test]
    async fn test_store_failure_skips_federation() {
        let tmp = tempfile::tempdir().unwrap();
        let store_path = tmp.path().join("credentials");
        std::fs::write(&store_path, "[broken\n").unwrap();
        let server = federation_server(0).await;
        let login = login(
            FakeAssumer::default(),
            CredentialStore::new(&store_path),
            &server,
        );

        let err = login
            .run(
                &dev_account(),
                &settings(),
                &OtpSource::Manual("123456".to_string()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GasyError::StoreRead { .. }));
    }
}
