use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::{
    constants::{self, DEFAULT_AWS_REGION, DEFAULT_SOURCE_PROFILE},
    error::{GasyError, Result},
};

/// Contents of `~/.gasy.toml`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub aws: AwsSection,
    #[serde(default)]
    pub yubikey: YubiKeySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsSection {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub mfa_serial: Option<String>,
    pub client_list_location: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YubiKeySection {
    pub slot_name: Option<String>,
}

/// Values given on the command line (or through their environment variables)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub mfa_serial: Option<String>,
    pub slot_name: Option<String>,
    pub client_list_location: Option<PathBuf>,
}

/// Configuration resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub region: String,
    pub source_profile: String,
    pub mfa_serial: Option<String>,
    pub slot_name: Option<String>,
    pub client_list_location: Option<PathBuf>,
    pub role_name: Option<String>,
}

/// Everything the login pipeline needs besides the account and the OTP source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSettings {
    pub region: String,
    pub source_profile: String,
    pub mfa_serial: String,
    pub role_name: String,
}

impl Config {
    /// Flags win over the config file, which wins over built-in defaults
    pub fn resolve(overrides: Overrides, file: FileConfig) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Self {
            region: non_empty(overrides.region)
                .or(non_empty(file.aws.region))
                .unwrap_or_else(|| DEFAULT_AWS_REGION.to_string()),
            source_profile: non_empty(overrides.profile)
                .or(non_empty(file.aws.profile))
                .unwrap_or_else(|| DEFAULT_SOURCE_PROFILE.to_string()),
            mfa_serial: non_empty(overrides.mfa_serial).or(non_empty(file.aws.mfa_serial)),
            slot_name: non_empty(overrides.slot_name).or(non_empty(file.yubikey.slot_name)),
            client_list_location: overrides
                .client_list_location
                .or_else(|| non_empty(file.aws.client_list_location).map(|p| expand_home(&p))),
            role_name: non_empty(file.aws.role),
        }
    }

    pub fn client_list_location(&self) -> Result<&Path> {
        self.client_list_location
            .as_deref()
            .ok_or_else(|| GasyError::input_resolution("no client list location configured"))
    }

    pub fn login_settings(&self, role_override: Option<String>) -> Result<LoginSettings> {
        let mfa_serial = self
            .mfa_serial
            .clone()
            .ok_or_else(|| GasyError::input_resolution("no MFA serial number configured"))?;

        let role_name = role_override
            .filter(|r| !r.trim().is_empty())
            .or_else(|| self.role_name.clone())
            .ok_or_else(|| GasyError::input_resolution("no role name given (use --role)"))?;

        Ok(LoginSettings {
            region: self.region.clone(),
            source_profile: self.source_profile.clone(),
            mfa_serial,
            role_name,
        })
    }
}

/// Load the config file. An explicitly named file must exist; the default one is optional.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match constants::get_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(FileConfig::default());
            }
        },
    };

    let raw = std::fs::read_to_string(&path).map_err(|e| {
        GasyError::input_resolution(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config = parse(&raw).map_err(|e| {
        GasyError::input_resolution(format!("invalid config file {}: {e}", path.display()))
    })?;

    info!("Using config file: {}", path.display());
    Ok(config)
}

fn parse(raw: &str) -> std::result::Result<FileConfig, toml::de::Error> {
    toml::from_str(raw)
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(path)),
        None => PathBuf::from(path),
    }
}
