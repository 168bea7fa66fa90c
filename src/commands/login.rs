use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::{
    account::AccountDirectory,
    aws::{
        StsRoleAssumer,
        console::{self, FederationClient},
        credentials::CredentialStore,
        sts,
    },
    config::Config,
    login::Login,
    otp::OtpSource,
};

#[derive(Debug, Clone, Args)]
pub struct LoginCommand {
    #[arg(help = "Account number (see `gasy accounts`) or account name")]
    pub account: String,

    #[arg(long, help = "IAM role name to assume in the account")]
    pub role: Option<String>,

    #[arg(long, help = "MFA code to use instead of generating one with the YubiKey")]
    pub code: Option<String>,

    #[arg(short = 'o', long, help = "Open the URL in the default browser")]
    pub open: bool,
}

impl LoginCommand {
    pub async fn execute(self, config: &Config) -> Result<()> {
        // Resolve every input before touching the YubiKey: the code is single-use.
        let settings = config.login_settings(self.role)?;
        let otp = OtpSource::resolve(self.code, config.slot_name.clone())?;
        let username = sts::current_username()?;

        let directory = AccountDirectory::load(config.client_list_location()?)
            .context("Failed to load account list")?;
        let account = directory.select(&self.account)?;

        info!("Starting login for account: {}", account.name);

        let login = Login::new(
            StsRoleAssumer::new(&settings.region, &settings.source_profile),
            CredentialStore::default_location()?,
            FederationClient::new()?,
            username,
        );

        let outcome = login.run(account, &settings, &otp).await?;

        let bold_green = |s: String| s.green().bold();
        println!("{}", bold_green("Credentials written to profile!".to_string()));
        println!("Credentials will expire at: {}", outcome.expiration);
        println!();
        println!("{}", bold_green(format!("export AWS_PROFILE={}", outcome.profile)));
        println!();
        println!("{}", bold_green(format!("URL: {}", outcome.console_url)));

        if self.open {
            console::open_browser(outcome.console_url.as_str())?;
        }

        Ok(())
    }
}
