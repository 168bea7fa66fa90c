use anyhow::{Context, Result};
use clap::Args;

use crate::{account::AccountDirectory, config::Config};

#[derive(Debug, Clone, Args)]
pub struct AccountsCommand {}

impl AccountsCommand {
    pub fn execute(self, config: &Config) -> Result<()> {
        let path = config.client_list_location()?;
        let directory = AccountDirectory::load(path).context("Failed to load account list")?;

        println!("{}", directory.to_table());
        Ok(())
    }
}
