//! Error types for the credential exchange pipeline

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, GasyError>;

/// Every variant is terminal for the invocation. OTP codes and sign-in tokens
/// are single-use, so nothing here is retried.
#[derive(Error, Debug)]
pub enum GasyError {
    #[error("missing or invalid input: {message}")]
    InputResolution { message: String },

    #[error("account directory error: {message}")]
    AccountDirectory { message: String },

    #[error("failed to obtain OTP code: {message}")]
    Otp { message: String },

    #[error("failed to assume role {role_arn}: {message}")]
    Assumption { role_arn: String, message: String },

    #[error("failed to read credentials file {}: {message}", path.display())]
    StoreRead { path: PathBuf, message: String },

    #[error("failed to write credentials file {}: {message}", path.display())]
    StoreWrite { path: PathBuf, message: String },

    #[error("federation request failed: {message}")]
    FederationRequest { message: String },

    #[error("unexpected federation response: {message}")]
    FederationDecode { message: String },
}

impl GasyError {
    pub fn input_resolution(message: impl Into<String>) -> Self {
        Self::InputResolution {
            message: message.into(),
        }
    }

    pub fn account_directory(message: impl Into<String>) -> Self {
        Self::AccountDirectory {
            message: message.into(),
        }
    }

    pub fn otp(message: impl Into<String>) -> Self {
        Self::Otp {
            message: message.into(),
        }
    }

    pub fn assumption(role_arn: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Assumption {
            role_arn: role_arn.into(),
            message: message.into(),
        }
    }

    pub fn store_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StoreRead {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn store_write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::StoreWrite {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn federation_request(message: impl Into<String>) -> Self {
        Self::FederationRequest {
            message: message.into(),
        }
    }

    pub fn federation_decode(message: impl Into<String>) -> Self {
        Self::FederationDecode {
            message: message.into(),
        }
    }
}
