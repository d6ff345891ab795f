// Credential storage: the API key, the API domain and the last known user
// profile live in a small JSON file in the user's config directory so they
// survive between invocations. `ApiClient` never touches the file; it is
// handed a `Credentials` value by the command layer.

use crate::error::{ApiError, ApiResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DOMAIN: &str = "https://api.orshot.com";
const CONFIG_FILENAME: &str = "config.json";
const APP_DIR: &str = "orshot-cli";

/// Environment variable overriding the directory holding the credential file.
pub const CONFIG_DIR_ENV: &str = "ORSHOT_CONFIG_DIR";

/// User profile as returned by the identity endpoint, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        UserProfile {
            user_id: "Unknown".into(),
            email: String::new(),
            name: String::new(),
        }
    }
}

/// Everything persisted between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_domain")]
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials {
            api_key: None,
            domain: default_domain(),
            user: None,
        }
    }
}

impl Credentials {
    /// Credentials holding only an API key, against the default domain.
    pub fn with_api_key(api_key: &str) -> Self {
        Credentials {
            api_key: Some(api_key.to_string()),
            ..Credentials::default()
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.api_key.as_deref().map_or(false, |k| !k.is_empty())
    }

    /// Returns the stored key, or `ApiError::Authentication` when there is
    /// none. Commands call this before doing any network work.
    pub fn require_auth(&self) -> ApiResult<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(ApiError::Authentication),
        }
    }

    /// First eight characters of the key followed by an ellipsis.
    pub fn masked_api_key(&self) -> String {
        match self.api_key.as_deref() {
            Some(key) => format!("{}...", key.chars().take(8).collect::<String>()),
            None => "(none)".into(),
        }
    }
}

/// Handle on the credential file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Store rooted at `ORSHOT_CONFIG_DIR` if set, otherwise at the
    /// platform config directory.
    pub fn from_env() -> Self {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
        };
        Self::in_dir(dir)
    }

    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        CredentialStore {
            path: dir.as_ref().join(CONFIG_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, or return defaults when it does not exist yet.
    pub fn load(&self) -> Result<Credentials> {
        if !self.path.exists() {
            return Ok(Credentials::default());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let creds = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt credential file {}", self.path.display()))?;
        Ok(creds)
    }

    pub fn save(&self, creds: &Credentials) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let content = serde_json::to_string_pretty(creds)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        log::debug!("saved credentials to {}", self.path.display());
        Ok(())
    }

    /// Remove everything stored. A missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }
}
