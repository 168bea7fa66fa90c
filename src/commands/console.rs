use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use crate::aws::{
    console::{self, FederationClient},
    credentials::CredentialStore,
};

#[derive(Debug, Clone, Args)]
pub struct ConsoleCommand {
    #[arg(help = "Profile in the AWS credentials file to sign in with")]
    pub profile: String,

    #[arg(short = 'o', long, help = "Open the URL in the default browser")]
    pub open: bool,
}

impl ConsoleCommand {
    pub async fn execute(self) -> Result<()> {
        let store = CredentialStore::default_location()?;
        let creds = store
            .load(&self.profile)
            .with_context(|| format!("Failed to load credentials for profile '{}'", self.profile))?;

        info!("Credentials for {} expire at {}", self.profile, creds.expiration_string());

        let url = FederationClient::new()?
            .console_url(&creds)
            .await
            .context("Failed to generate console URL")?;

        println!("{}", format!("URL: {url}").green().bold());

        if self.open {
            console::open_browser(url.as_str())?;
            info!("Opened AWS Management Console in browser");
        }

        Ok(())
    }
}
