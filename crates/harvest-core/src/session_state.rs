//! Persisted authenticated browser state
//!
//! Cookies plus per-origin local storage, enough to skip the login form on
//! the next run. Stored as a single JSON file.

use crate::{HarvestError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageState {
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
    #[serde(default)]
    pub origins: Vec<OriginStorage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    /// Seconds since the epoch; negative for session cookies
    #[serde(default = "session_expiry")]
    pub expires: f64,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub same_site: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginStorage {
    pub origin: String,
    #[serde(default)]
    pub local_storage: Vec<StorageEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEntry {
    pub name: String,
    pub value: String,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn session_expiry() -> f64 {
    -1.0
}

impl StoredCookie {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires > 0.0 && self.expires < now.timestamp() as f64
    }
}

impl StorageState {
    pub fn new(cookies: Vec<StoredCookie>, origins: Vec<OriginStorage>) -> Self {
        Self {
            saved_at: Utc::now(),
            cookies,
            origins,
        }
    }

    /// Cookies that are still valid at `now`
    pub fn live_cookies(&self, now: DateTime<Utc>) -> impl Iterator<Item = &StoredCookie> {
        self.cookies.iter().filter(move |c| !c.is_expired(now))
    }

    /// Load saved state
    ///
    /// Returns `Ok(None)` when there is no file, or when the file cannot be
    /// decoded (a corrupt session is as good as none, and gets overwritten by
    /// the next login).
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No session file at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await.map_err(|e| {
            HarvestError::Session(format!("Failed to save session to {}: {}", path.display(), e))
        })
    }
}
