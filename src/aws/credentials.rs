use aws_smithy_types::{DateTime, date_time::Format};
use ini::{Ini, ParseOption};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::{debug, info};

use super::Credentials;
use crate::{
    constants,
    error::{GasyError, Result},
};

pub const ACCESS_KEY_ID_KEY: &str = "aws_access_key_id";
pub const SECRET_ACCESS_KEY_KEY: &str = "aws_secret_access_key";
pub const SESSION_TOKEN_KEY: &str = "aws_session_token";
pub const EXPIRATION_KEY: &str = "expiration";

/// AWS shared credentials file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `AWS_SHARED_CREDENTIALS_FILE` or `~/.aws/credentials`
    pub fn default_location() -> Result<Self> {
        constants::get_aws_credentials_path()
            .map(Self::new)
            .ok_or_else(|| GasyError::input_resolution("failed to determine AWS credentials path"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge `creds` into the `profile` section and rewrite the whole file.
    /// Lines outside the four credential keys of `profile` are written back
    /// unchanged, comments included.
    pub async fn save(&self, profile: &str, creds: &Credentials) -> Result<()> {
        let target = self.target_path()?;
        let existing = read_raw(&target)?;

        if let Some(raw) = &existing {
            parse(raw).map_err(|e| GasyError::store_read(&target, e))?;
        }

        let expiration = creds.expiration_string();
        let updated = merge_profile(
            existing.as_deref().unwrap_or_default(),
            profile,
            &[
                (ACCESS_KEY_ID_KEY, creds.access_key_id.as_str()),
                (SECRET_ACCESS_KEY_KEY, creds.secret_access_key.as_str()),
                (SESSION_TOKEN_KEY, creds.session_token.as_str()),
                (EXPIRATION_KEY, expiration.as_str()),
            ],
        );

        write_atomic(&target, &updated).await?;

        info!("Credentials saved to profile: {}", profile);
        Ok(())
    }

    /// Load previously saved temporary credentials for `profile`
    pub fn load(&self, profile: &str) -> Result<Credentials> {
        let raw = read_raw(&self.path)?.ok_or_else(|| {
            GasyError::store_read(&self.path, "file not found. Please run `gasy login` first")
        })?;
        let ini = parse(&raw).map_err(|e| GasyError::store_read(&self.path, e))?;

        let section = ini.section(Some(profile)).ok_or_else(|| {
            GasyError::store_read(&self.path, format!("profile '{profile}' not found"))
        })?;

        let get = |key: &str| {
            section
                .get(key)
                .map(str::to_string)
                .ok_or_else(|| GasyError::store_read(&self.path, format!("{key} not found")))
        };

        let expiration_str = get(EXPIRATION_KEY)?;
        let expiration = DateTime::from_str(&expiration_str, Format::DateTime)
            .or_else(|_| DateTime::from_str(&expiration_str, Format::DateTimeWithOffset))
            .map_err(|e| {
                GasyError::store_read(&self.path, format!("invalid {EXPIRATION_KEY}: {e}"))
            })?;

        Ok(Credentials {
            access_key_id: get(ACCESS_KEY_ID_KEY)?,
            secret_access_key: get(SECRET_ACCESS_KEY_KEY)?,
            session_token: get(SESSION_TOKEN_KEY)?,
            expiration,
        })
    }

    /// The file to replace. A symlinked store is followed so the link survives.
    fn target_path(&self) -> Result<PathBuf> {
        if !self.path.exists() {
            return Ok(self.path.clone());
        }

        std::fs::canonicalize(&self.path)
            .map_err(|e| GasyError::store_read(&self.path, e.to_string()))
    }
}

/// Values are taken literally: no quote or backslash processing, matching
/// how the AWS SDKs read the file.
fn parse(raw: &str) -> std::result::Result<Ini, String> {
    let options = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..Default::default()
    };
    Ini::load_from_str_opt(raw, options).map_err(|e| e.to_string())
}

/// `None` when the file does not exist yet
fn read_raw(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        debug!("{} does not exist, starting empty", path.display());
        return Ok(None);
    }

    std::fs::read_to_string(path)
        .map(Some)
        .map_err(|e| GasyError::store_read(path, e.to_string()))
}

fn section_name(line: &str) -> Option<&str> {
    line.trim()
        .strip_prefix('[')?
        .strip_suffix(']')
        .map(str::trim)
}

fn key_name(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(['#', ';', '[']) {
        return None;
    }
    let end = trimmed.find(['=', ':'])?;
    Some(trimmed[..end].trim())
}

/// Set `entries` in the first `[profile]` section of `raw`, appending the
/// section when it is missing. Every other line is kept as is.
fn merge_profile(raw: &str, profile: &str, entries: &[(&str, &str)]) -> String {
    let newline = if raw.contains("\r\n") { "\r\n" } else { "\n" };
    let mut lines: Vec<String> = raw.lines().map(str::to_string).collect();

    match lines.iter().position(|l| section_name(l) == Some(profile)) {
        Some(start) => {
            let end = lines[start + 1..]
                .iter()
                .position(|l| section_name(l).is_some())
                .map_or(lines.len(), |i| start + 1 + i);

            let mut written: Vec<&str> = Vec::new();
            let mut body: Vec<String> = Vec::new();
            for line in lines.drain(start + 1..end) {
                match key_name(&line).and_then(|k| entries.iter().find(|(key, _)| *key == k)) {
                    // Duplicate keys would shadow the fresh value, drop them
                    Some((key, _)) if written.contains(key) => {}
                    Some((key, value)) => {
                        written.push(*key);
                        body.push(format!("{key} = {value}"));
                    }
                    None => body.push(line),
                }
            }

            let insert_at = body
                .iter()
                .rposition(|l| !l.trim().is_empty())
                .map_or(0, |i| i + 1);
            let missing = entries
                .iter()
                .filter(|(key, _)| !written.contains(key))
                .map(|(key, value)| format!("{key} = {value}"));
            body.splice(insert_at..insert_at, missing);

            lines.splice(start + 1..start + 1, body);
        }
        None => {
            if lines.last().is_some_and(|l| !l.trim().is_empty()) {
                lines.push(String::new());
            }
            lines.push(format!("[{profile}]"));
            lines.extend(entries.iter().map(|(key, value)| format!("{key} = {value}")));
        }
    }

    let mut out = lines.join(newline);
    out.push_str(newline);
    out
}

/// Write to a sibling temp file and rename it over `target`, so a failed
/// write leaves the previous file intact.
async fn write_atomic(target: &Path, contents: &str) -> Result<()> {
    let write_err = |e: std::io::Error| GasyError::store_write(target, e.to_string());

    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).await.map_err(write_err)?;

    let mut tmp = NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(contents.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(tmp.path(), permissions).map_err(write_err)?;
    }

    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.persist(target).map_err(|e| write_err(e.error))?;

    Ok(())
}
