use colored::Colorize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{GasyError, Result};

const YKMAN_PROGRAM: &str = "ykman";

/// Where the one-time MFA code comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpSource {
    /// Code typed in by the operator
    Manual(String),
    /// OATH code generated by an attached YubiKey for the named slot
    YubiKey { slot: String },
}

impl OtpSource {
    /// Pick the operator-supplied code when present, otherwise the YubiKey slot
    pub fn resolve(manual_code: Option<String>, slot: Option<String>) -> Result<Self> {
        match (manual_code, slot) {
            (Some(code), _) => Ok(Self::Manual(code)),
            (None, Some(slot)) => Ok(Self::YubiKey { slot }),
            (None, None) => Err(GasyError::input_resolution(
                "no YubiKey slot name configured and no --code given",
            )),
        }
    }

    pub async fn obtain(&self) -> Result<String> {
        let code = match self {
            Self::Manual(code) => {
                info!("Using operator-supplied MFA code");
                code.trim().to_string()
            }
            Self::YubiKey { slot } => {
                println!("{}", "Please touch your YubiKey...".green().bold());
                generate_with_ykman(slot).await?
            }
        };

        validate_code(&code)?;
        Ok(code)
    }
}

/// Generate an OATH code for `slot`. Blocks until the key is touched when the
/// slot requires touch.
async fn generate_with_ykman(slot: &str) -> Result<String> {
    debug!("Running {} for slot {}", YKMAN_PROGRAM, slot);

    let output = Command::new(YKMAN_PROGRAM)
        .args(["oath", "accounts", "code", "--single", slot])
        .output()
        .await
        .map_err(|e| GasyError::otp(format!("failed to run {YKMAN_PROGRAM}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GasyError::otp(format!(
            "{YKMAN_PROGRAM} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    parse_ykman_output(&String::from_utf8_lossy(&output.stdout))
}

fn parse_ykman_output(stdout: &str) -> Result<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GasyError::otp(format!("{YKMAN_PROGRAM} produced no code")))
}

fn validate_code(code: &str) -> Result<()> {
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GasyError::otp("MFA code must be a non-empty alphanumeric string"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    fn test_resolve_prefers_manual_code() {
        let source = OtpSource::resolve(Some("123456".to_string()), Some("aws".to_string()));
        assert_eq!(source.unwrap(), OtpSource::Manual("123456".to_string()));
    }

    #[test]
    fn test_resolve_falls_back_to_yubikey() {
        let source = OtpSource::resolve(None, Some("aws:mfa".to_string())).unwrap();
        assert_eq!(
            source,
            OtpSource::YubiKey {
                slot: "aws:mfa".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_without_any_source() {
        let err = OtpSource::resolve(None, None).unwrap_err();
        assert!(matches!(err, GasyError::InputResolution { .. }));
    }

    #[tokio::test]
    async fn test_manual_code_is_trimmed() {
        let code = OtpSource::Manual(" 123456\n".to_string())
            .obtain()
            .await
            .unwrap();
        assert_eq!(code, "123456");
    }

    #[tokio::test]
    async fn test_manual_code_rejects_garbage() {
        assert!(OtpSource::Manual(String::new()).obtain().await.is_err());
        assert!(OtpSource::Manual("12 34".to_string()).obtain().await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_ykman_is_an_otp_error() {
        let empty = tempfile::tempdir().unwrap();
        let original = env::var("PATH").ok();
        unsafe {
            env::set_var("PATH", empty.path());
        }

        let result = OtpSource::YubiKey {
            slot: "aws:mfa".to_string(),
        }
        .obtain()
        .await;

        unsafe {
            match original {
                Some(val) => env::set_var("PATH", val),
                None => env::remove_var("PATH"),
            }
        }
        let err = result.unwrap_err();
        assert!(matches!(err, GasyError::Otp { .. }));
        assert!(err.to_string().contains("failed to run ykman"));
    }

    #[test]
    fn test_parse_ykman_output() {
        assert_eq!(parse_ykman_output("654321\n").unwrap(), "654321");
        assert_eq!(parse_ykman_output("\n  987654  \n").unwrap(), "987654");
        assert!(parse_ykman_output("   \n").is_err());
    }
}
