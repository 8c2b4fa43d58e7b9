//! Credential storage for the sending account.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::credentials::{DEFAULT_CREDENTIALS_FILENAME, DEFAULT_STATE_DIR};
use crate::errors::MenuError;

/// Key-value secret provider keyed by `(service, user)`.
pub trait SecretProvider {
    /// Stored secret, `None` when no entry exists.
    fn get(&self, service: &str, user: &str) -> Result<Option<String>, MenuError>;
    /// Create or replace the secret for `(service, user)`.
    fn set(&self, service: &str, user: &str, secret: &str) -> Result<(), MenuError>;
    /// Remove the entry; returns whether one existed.
    fn delete(&self, service: &str, user: &str) -> Result<bool, MenuError>;
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    entries: Vec<CredentialEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CredentialEntry {
    service: String,
    user: String,
    secret: String,
}

/// JSON file holding credential entries.
///
/// A missing file reads as empty; writes go through a temp file and rename.
#[derive(Clone, Debug)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    /// Store backed by the file at `path`; it is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `.weekly_menu/credentials.json` under the working directory.
    pub fn default_path() -> PathBuf {
        Self::default_path_in_dir(DEFAULT_STATE_DIR)
    }

    /// Credentials file location inside `dir`.
    pub fn default_path_in_dir<P: AsRef<Path>>(dir: P) -> PathBuf {
        dir.as_ref().join(DEFAULT_CREDENTIALS_FILENAME)
    }

    fn load(&self) -> Result<CredentialsFile, MenuError> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|err| {
                MenuError::Credentials(format!(
                    "credentials file {} is unreadable: {err}",
                    self.path.display()
                ))
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(CredentialsFile::default()),
            Err(err) => Err(MenuError::Credentials(format!(
                "failed to read {}: {err}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, file: &CredentialsFile) -> Result<(), MenuError> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(file)
            .map_err(|err| MenuError::Credentials(format!("failed to encode credentials: {err}")))?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, payload)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SecretProvider for FileSecretStore {
    fn get(&self, service: &str, user: &str) -> Result<Option<String>, MenuError> {
        Ok(self
            .load()?
            .entries
            .into_iter()
            .find(|entry| entry.service == service && entry.user == user)
            .map(|entry| entry.secret))
    }

    fn set(&self, service: &str, user: &str, secret: &str) -> Result<(), MenuError> {
        let mut file = self.load()?;
        file.entries
            .retain(|entry| !(entry.service == service && entry.user == user));
        file.entries.push(CredentialEntry {
            service: service.to_string(),
            user: user.to_string(),
            secret: secret.to_string(),
        });
        self.save(&file)?;
        info!(
            "[weekly_menu:credentials] stored password for user {} and {} service",
            user, service
        );
        Ok(())
    }

    fn delete(&self, service: &str, user: &str) -> Result<bool, MenuError> {
        let mut file = self.load()?;
        let before = file.entries.len();
        file.entries
            .retain(|entry| !(entry.service == service && entry.user == user));
        if file.entries.len() == before {
            return Ok(false);
        }
        self.save(&file)?;
        Ok(true)
    }
}

/// Fetch a secret that must exist.
pub fn require_secret(
    provider: &dyn SecretProvider,
    service: &str,
    user: &str,
) -> Result<String, MenuError> {
    provider.get(service, user)?.ok_or_else(|| {
        MenuError::Credentials(format!(
            "no password stored for user '{user}' and service '{service}'; run with --configure first"
        ))
    })
}
