//! Authenticated session reuse
//!
//! A saved [`StorageState`] is restored first. Only when the app no longer
//! recognizes it does the manager ask for credentials and log in afresh,
//! saving the new state for next time.

use crate::browser::BrowserSession;
use crate::error::{BrowserError, Result};
use crate::locator;
use harvest_core::config::{LoginForm, SiteConfig};
use harvest_core::{
    CredentialProvider, HarvestConfig, OriginStorage, StorageEntry, StorageState,
};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// How the tab became authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// A saved session was still valid
    Reused,
    /// A fresh login was performed and saved
    LoggedIn,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reused => write!(f, "reused saved session"),
            Self::LoggedIn => write!(f, "fresh login"),
        }
    }
}

/// Persists and restores authenticated browser state
pub struct SessionManager {
    site: SiteConfig,
    login: LoginForm,
    session_file: PathBuf,
    check_timeout: Duration,
}

impl SessionManager {
    pub fn new(config: &HarvestConfig) -> Self {
        Self {
            site: config.site.clone(),
            login: config.login.clone(),
            session_file: config.paths.session_file.clone(),
            check_timeout: Duration::from_secs(config.browser.session_check_timeout_seconds),
        }
    }

    pub fn session_file(&self) -> &PathBuf {
        &self.session_file
    }

    /// Leave the tab signed in, reusing saved state when possible
    pub async fn establish(
        &self,
        session: &BrowserSession,
        credentials: &dyn CredentialProvider,
    ) -> Result<SessionOutcome> {
        match StorageState::load(&self.session_file).await? {
            Some(state) => {
                info!("Session file found. Reusing session.");
                self.restore(session, &state).await?;
            }
            None => info!("No session file found."),
        }

        info!("Verifying session...");
        if self.is_signed_in(session).await {
            info!("Session is valid.");
            return Ok(SessionOutcome::Reused);
        }

        self.login(session, credentials).await?;
        Ok(SessionOutcome::LoggedIn)
    }

    /// Apply saved cookies and local storage to the tab
    pub async fn restore(&self, session: &BrowserSession, state: &StorageState) -> Result<()> {
        let cookies: Vec<_> = state.live_cookies(Utc::now()).cloned().collect();
        let skipped = state.cookies.len() - cookies.len();
        if skipped > 0 {
            debug!("Dropping {} expired cookies", skipped);
        }
        if !cookies.is_empty() {
            session.set_cookies(&cookies).await?;
        }

        for origin in state.origins.iter().filter(|o| !o.local_storage.is_empty()) {
            // localStorage is only writable from a document on that origin
            session.navigate(&origin.origin).await?;
            session
                .evaluate_script(&restore_local_storage_script(&origin.local_storage))
                .await?;
            debug!(
                "Restored {} local storage entries for {}",
                origin.local_storage.len(),
                origin.origin
            );
        }

        Ok(())
    }

    /// Open the data page and look for the signed-in marker
    pub async fn is_signed_in(&self, session: &BrowserSession) -> bool {
        if let Err(e) = session.navigate(&self.site.data_url).await {
            debug!("Session check navigation failed: {}", e);
            return false;
        }

        session
            .wait_for_xpath(
                &locator::text(&self.site.signed_in_text),
                Some(self.check_timeout),
            )
            .await
            .is_ok()
    }

    /// Fill in the login form, wait for the post-login page, save state
    pub async fn login(
        &self,
        session: &BrowserSession,
        credentials: &dyn CredentialProvider,
    ) -> Result<()> {
        info!("No valid session. Logging in...");
        let creds = credentials.credentials()?;

        session.navigate(&self.site.login_url).await?;
        session
            .type_into_xpath(&locator::labelled_input(&self.login.email_label), &creds.username)
            .await?;
        session
            .type_into_xpath(
                &locator::labelled_input(&self.login.password_label),
                &creds.password,
            )
            .await?;
        session.click(&self.login.submit_selector).await?;

        session
            .wait_for_url(&self.site.post_login_url, None)
            .await
            .map_err(|e| BrowserError::Session(format!("Login did not complete: {}", e)))?;
        info!("Login successful.");

        self.save(session).await?;
        Ok(())
    }

    /// Capture the tab's cookies and the current origin's local storage
    pub async fn save(&self, session: &BrowserSession) -> Result<StorageState> {
        let cookies = session.cookies().await?;

        let mut origins = Vec::new();
        if let Some(origin) = origin_of(&session.current_url()) {
            let entries: Vec<StorageEntry> = session
                .evaluate_json(CAPTURE_LOCAL_STORAGE_SCRIPT)
                .await
                .unwrap_or_else(|e| {
                    warn!("Could not read local storage for {}: {}", origin, e);
                    Vec::new()
                });
            origins.push(OriginStorage {
                origin,
                local_storage: entries,
            });
        }

        let state = StorageState::new(cookies, origins);
        state.save(&self.session_file).await?;
        info!("Session saved to '{}'.", self.session_file.display());
        Ok(state)
    }
}

const CAPTURE_LOCAL_STORAGE_SCRIPT: &str = r#"(() => {
    const entries = [];
    for (let i = 0; i < localStorage.length; i++) {
        const name = localStorage.key(i);
        entries.push({ name, value: localStorage.getItem(name) });
    }
    return JSON.stringify(entries);
})()"#;

/// Script that writes `entries` into the current origin's localStorage
pub(crate) fn restore_local_storage_script(entries: &[StorageEntry]) -> String {
    let payload = serde_json::Value::Array(
        entries
            .iter()
            .map(|e| serde_json::json!({ "name": e.name, "value": e.value }))
            .collect(),
    );
    format!(
        "(() => {{ for (const e of {}) {{ localStorage.setItem(e.name, e.value); }} return JSON.stringify(true); }})()",
        payload
    )
}

/// `scheme://host[:port]` of an http(s) URL
pub(crate) fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed.origin().ascii_serialization()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://hiring.idenhq.com/instructions?x=1"),
            Some("https://hiring.idenhq.com".to_string())
        );
        assert_eq!(
            origin_of("http://localhost:8080/app"),
            Some("http://localhost:8080".to_string())
        );
        assert_eq!(origin_of("about:blank"), None);
        assert_eq!(origin_of("not a url"), None);
    }

    #[test]
    fn test_restore_script_embeds_entries_as_json() {
        let script = restore_local_storage_script(&[StorageEntry {
            name: "token".to_string(),
            value: "a\"b".to_string(),
        }]);
        assert!(script.contains(r#"[{"name":"token","value":"a\"b"}]"#));
        assert!(script.contains("localStorage.setItem(e.name, e.value)"));
    }

    #[test]
    fn test_manager_uses_configured_paths() {
        let mut config = HarvestConfig::default();
        config.paths.session_file = PathBuf::from("/tmp/custom_session.json");
        config.browser.session_check_timeout_seconds = 2;

        let manager = SessionManager::new(&config);
        assert_eq!(manager.session_file(), &PathBuf::from("/tmp/custom_session.json"));
        assert_eq!(manager.check_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(SessionOutcome::Reused.to_string(), "reused saved session");
        assert_eq!(SessionOutcome::LoggedIn.to_string(), "fresh login");
    }
}
