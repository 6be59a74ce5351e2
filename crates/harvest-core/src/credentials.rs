//! Login credentials
//!
//! Supports three sources behind one [`CredentialProvider`] capability:
//! 1. A JSON file with `IDEN_USERNAME` / `IDEN_PASSWORD` keys
//! 2. Environment variables with the same names
//! 3. Values supplied directly by the caller

use crate::{HarvestError, Result};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Key holding the login email, in files and in the environment
pub const USERNAME_KEY: &str = "IDEN_USERNAME";
/// Key holding the login password, in files and in the environment
pub const PASSWORD_KEY: &str = "IDEN_PASSWORD";

/// Username/password pair for the login form
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of login credentials
///
/// Fails with [`HarvestError::MissingCredentials`] when nothing usable is
/// available.
pub trait CredentialProvider: Send + Sync {
    fn credentials(&self) -> Result<Credentials>;

    /// Human-readable source name for logs
    fn describe(&self) -> String;
}

#[derive(Deserialize)]
struct CredentialFile {
    #[serde(rename = "IDEN_USERNAME")]
    username: Option<String>,
    #[serde(rename = "IDEN_PASSWORD")]
    password: Option<String>,
}

/// Credentials read from a JSON file
#[derive(Debug, Clone)]
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialProvider for FileCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HarvestError::MissingCredentials(format!(
                    "{} not found; create it with {} and {}",
                    self.path.display(),
                    USERNAME_KEY,
                    PASSWORD_KEY
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let file: CredentialFile = serde_json::from_str(&content).map_err(|e| {
            HarvestError::MissingCredentials(format!(
                "Could not decode {}: {}",
                self.path.display(),
                e
            ))
        })?;

        complete(file.username, file.password).ok_or_else(|| {
            HarvestError::MissingCredentials(format!(
                "'{}' or '{}' not found in {}",
                USERNAME_KEY,
                PASSWORD_KEY,
                self.path.display()
            ))
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Credentials read from `IDEN_USERNAME` / `IDEN_PASSWORD`
#[derive(Debug, Clone, Default)]
pub struct EnvCredentials;

impl CredentialProvider for EnvCredentials {
    fn credentials(&self) -> Result<Credentials> {
        complete(env::var(USERNAME_KEY).ok(), env::var(PASSWORD_KEY).ok()).ok_or_else(|| {
            HarvestError::MissingCredentials(format!(
                "Set both {} and {} in the environment",
                USERNAME_KEY, PASSWORD_KEY
            ))
        })
    }

    fn describe(&self) -> String {
        "environment".to_string()
    }
}

/// Credentials handed in directly
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self(Credentials::new(username, password))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credentials(&self) -> Result<Credentials> {
        complete(Some(self.0.username.clone()), Some(self.0.password.clone())).ok_or_else(|| {
            HarvestError::MissingCredentials("Supplied username or password is empty".to_string())
        })
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// First provider that yields credentials wins
///
/// Priority is the order providers were added.
#[derive(Default)]
pub struct ChainedCredentials {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl ChainedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl CredentialProvider for ChainedCredentials {
    fn credentials(&self) -> Result<Credentials> {
        let mut reasons = Vec::new();
        for provider in &self.providers {
            match provider.credentials() {
                Ok(credentials) => {
                    tracing::info!("Using credentials from {}", provider.describe());
                    return Ok(credentials);
                }
                Err(e) => reasons.push(format!("{}: {}", provider.describe(), e)),
            }
        }

        if reasons.is_empty() {
            return Err(HarvestError::MissingCredentials(
                "No credential sources configured".to_string(),
            ));
        }
        Err(HarvestError::MissingCredentials(reasons.join("; ")))
    }

    fn describe(&self) -> String {
        let names: Vec<String> = self.providers.iter().map(|p| p.describe()).collect();
        format!("chain [{}]", names.join(", "))
    }
}

fn complete(username: Option<String>, password: Option<String>) -> Option<Credentials> {
    match (username, password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => Some(Credentials::new(u, p)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to prevent concurrent env var modifications
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_env_vars<F, R>(vars: &[(&str, Option<&str>)], f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _guard = ENV_LOCK.lock().unwrap();

        let originals: Vec<_> = vars.iter().map(|(k, _)| (*k, env::var(k).ok())).collect();

        for (key, value) in vars {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        let result = f();

        for (key, original) in originals {
            match original {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        result
    }

    fn write_file(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_file_credentials() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            r#"{"IDEN_USERNAME": "me@example.com", "IDEN_PASSWORD": "hunter2"}"#,
        );

        let creds = FileCredentials::new(path).credentials().unwrap();
        assert_eq!(creds, Credentials::new("me@example.com", "hunter2"));
    }

    #[test]
    fn test_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = FileCredentials::new(dir.path().join("config.json"))
            .credentials()
            .unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredentials(ref m) if m.contains("not found")));
    }

    #[test]
    fn test_file_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "{ not json");
        let err = FileCredentials::new(path).credentials().unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredentials(ref m) if m.contains("decode")));
    }

    #[test]
    fn test_file_missing_key() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, r#"{"IDEN_USERNAME": "me@example.com"}"#);
        let err = FileCredentials::new(path).credentials().unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredentials(ref m) if m.contains("IDEN_PASSWORD")));
    }

    #[test]
    fn test_env_credentials() {
        with_env_vars(
            &[
                (USERNAME_KEY, Some("env@example.com")),
                (PASSWORD_KEY, Some("secret")),
            ],
            || {
                let creds = EnvCredentials.credentials().unwrap();
                assert_eq!(creds.username, "env@example.com");
            },
        );
    }

    #[test]
    fn test_env_missing() {
        with_env_vars(&[(USERNAME_KEY, None), (PASSWORD_KEY, None)], || {
            assert!(matches!(
                EnvCredentials.credentials(),
                Err(HarvestError::MissingCredentials(_))
            ));
        });
    }

    #[test]
    fn test_static_rejects_empty() {
        assert!(StaticCredentials::new("", "pw").credentials().is_err());
        assert!(StaticCredentials::new("me", "pw").credentials().is_ok());
    }

    #[test]
    fn test_chain_falls_through() {
        let dir = TempDir::new().unwrap();
        let chain = ChainedCredentials::new()
            .with(FileCredentials::new(dir.path().join("absent.json")))
            .with(StaticCredentials::new("fallback", "pw"));

        assert_eq!(chain.credentials().unwrap().username, "fallback");
    }

    #[test]
    fn test_chain_all_missing() {
        let dir = TempDir::new().unwrap();
        let chain = ChainedCredentials::new().with(FileCredentials::new(dir.path().join("absent.json")));
        let err = chain.credentials().unwrap_err();
        assert!(matches!(err, HarvestError::MissingCredentials(ref m) if m.contains("absent.json")));

        assert!(ChainedCredentials::new().credentials().is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("me", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("redacted"));
    }
}
