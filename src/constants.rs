use std::{env, path::PathBuf};

/// Tag prepended to the operator's username to form the STS role session name
pub const APP_TAG: &str = "gasy";

/// Default AWS region for STS operations when none is configured
pub const DEFAULT_AWS_REGION: &str = "eu-west-1";

/// Profile holding the long-lived credentials that sign the AssumeRole call
pub const DEFAULT_SOURCE_PROFILE: &str = "default";

/// Lifetime requested for assumed-role sessions
pub const SESSION_DURATION_SECONDS: i32 = 3600;

/// AWS partition used when building role ARNs
pub const AWS_PARTITION: &str = "aws";

/// AWS federation endpoint (getSigninToken and login)
pub const FEDERATION_ENDPOINT: &str = "https://signin.aws.amazon.com/federation";

/// Console page the login URL lands on
pub const CONSOLE_DESTINATION: &str = "https://console.aws.amazon.com/";

/// AWS configuration directory name
pub const AWS_CONFIG_DIR_NAME: &str = ".aws";

/// AWS shared credentials file name
pub const AWS_CREDENTIALS_FILE_NAME: &str = "credentials";

/// gasy configuration file name, looked up in the home directory
pub const CONFIG_FILE_NAME: &str = ".gasy.toml";

/// Get the AWS credentials file path
/// Respects AWS_SHARED_CREDENTIALS_FILE environment variable if set
pub fn get_aws_credentials_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("AWS_SHARED_CREDENTIALS_FILE") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| {
        home.join(AWS_CONFIG_DIR_NAME)
            .join(AWS_CREDENTIALS_FILE_NAME)
    })
}

/// Get the gasy configuration file path
/// Respects GASY_CONFIG environment variable if set
pub fn get_config_path() -> Option<PathBuf> {
    if let Ok(path) = env::var("GASY_CONFIG") {
        return Some(PathBuf::from(path));
    }

    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}
