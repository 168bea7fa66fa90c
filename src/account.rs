use std::path::Path;

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::{GasyError, Result};

/// AWS account entry from the account directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    /// External id for the role trust policy. Empty strings are treated as absent.
    #[serde(default, rename = "sid", deserialize_with = "non_empty")]
    pub external_id: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Account directory file: `{"accounts": [...]}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountDirectory {
    pub accounts: Vec<Account>,
}

impl AccountDirectory {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GasyError::account_directory(format!("cannot read {}: {e}", path.display()))
        })?;
        let directory = Self::from_json(&raw).map_err(|e| match e {
            GasyError::AccountDirectory { message } => {
                GasyError::account_directory(format!("{}: {message}", path.display()))
            }
            other => other,
        })?;
        debug!(
            "Loaded {} accounts from {}",
            directory.accounts.len(),
            path.display()
        );
        Ok(directory)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| GasyError::account_directory(format!("invalid account list: {e}")))
    }

    /// Select an account by its position in the directory or by name
    pub fn select(&self, selector: &str) -> Result<&Account> {
        if let Ok(index) = selector.parse::<usize>() {
            return self.accounts.get(index).ok_or_else(|| {
                GasyError::account_directory(format!(
                    "account #{index} does not exist ({} accounts configured)",
                    self.accounts.len()
                ))
            });
        }

        self.accounts
            .iter()
            .find(|a| a.name == selector)
            .ok_or_else(|| GasyError::account_directory(format!("no account named '{selector}'")))
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "Name", "Description", "ID"]);

        for (index, account) in self.accounts.iter().enumerate() {
            table.add_row(vec![
                index.to_string(),
                account.name.clone(),
                account.description.clone(),
                account.id.clone(),
            ]);
        }

        table
    }
}

fn non_empty<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}
