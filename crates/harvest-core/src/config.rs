//! Configuration management for tabharvest
//!
//! Every URL, file path, selector and delay a run depends on lives here and is
//! handed to the session, navigation and collection components explicitly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{HarvestError, Result};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

/// Run-level configuration
///
/// Loaded from `harvest.toml`; missing sections fall back to defaults that
/// target the Iden product inventory challenge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Where the application lives
    #[serde(default)]
    pub site: SiteConfig,

    /// Files read and written by a run
    #[serde(default)]
    pub paths: PathsConfig,

    /// Browser launch and wait settings
    #[serde(default)]
    pub browser: BrowserSettings,

    /// Login form location
    #[serde(default)]
    pub login: LoginForm,

    /// UI steps that reveal the table
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Table and scroll container selectors
    #[serde(default)]
    pub table: TableSelectors,

    /// Extraction loop tuning
    #[serde(default)]
    pub collector: CollectorSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// URL the app redirects to after a successful login
    #[serde(default = "default_post_login_url")]
    pub post_login_url: String,

    /// Page hosting the data view
    #[serde(default = "default_data_url")]
    pub data_url: String,

    /// Text only visible to a signed-in user
    #[serde(default = "default_signed_in_text")]
    pub signed_in_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,

    #[serde(default = "default_output_file")]
    pub output_file: PathBuf,

    /// JSON file holding `IDEN_USERNAME` / `IDEN_PASSWORD`
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    #[serde(default)]
    pub headless: bool,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    #[serde(default)]
    pub user_agent: Option<String>,

    /// Upper bound for element and URL waits
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// How long to look for the signed-in marker when checking a restored session
    #[serde(default = "default_session_check_timeout_seconds")]
    pub session_check_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default = "default_email_label")]
    pub email_label: String,

    #[serde(default = "default_password_label")]
    pub password_label: String,

    #[serde(default = "default_submit_selector")]
    pub submit_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default = "default_nav_steps")]
    pub steps: Vec<NavStep>,
}

/// One UI action on the way to the data view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavStep {
    pub action: NavAction,
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    /// Load `target` unless the tab is already there
    GotoIfElsewhere,
    /// Click the button whose accessible name is `target`
    ClickButton,
    /// Click the element whose text is `target`
    ClickText,
    /// Wait for the CSS selector `target` to appear
    WaitFor,
}

impl NavStep {
    pub fn new(action: NavAction, target: impl Into<String>) -> Self {
        Self {
            action,
            target: target.into(),
        }
    }
}

impl std::fmt::Display for NavStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self.action {
            NavAction::GotoIfElsewhere => "goto",
            NavAction::ClickButton => "click button",
            NavAction::ClickText => "click text",
            NavAction::WaitFor => "wait for",
        };
        write!(f, "{} '{}'", verb, self.target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSelectors {
    /// Element whose `scrollTop` drives lazy loading
    #[serde(default = "default_container_selector")]
    pub container_selector: String,

    #[serde(default = "default_table_selector")]
    pub table_selector: String,

    /// Column whose value comes from a nested sub-element
    #[serde(default = "default_rating_column")]
    pub rating_column: String,

    #[serde(default = "default_rating_selector")]
    pub rating_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorSettings {
    /// Fixed pause after each scroll. There is no reliable render-complete
    /// signal, so this stays a conservative constant.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Overall bound on one extraction run
    #[serde(default = "default_collector_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl CollectorSettings {
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

// Default value providers
fn default_login_url() -> String {
    "https://hiring.idenhq.com/".to_string()
}

fn default_post_login_url() -> String {
    "https://hiring.idenhq.com/instructions".to_string()
}

fn default_data_url() -> String {
    "https://hiring.idenhq.com/challenge".to_string()
}

fn default_signed_in_text() -> String {
    "Sign out".to_string()
}

fn default_session_file() -> PathBuf {
    PathBuf::from("iden_session.json")
}

fn default_output_file() -> PathBuf {
    PathBuf::from("products_data.json")
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("config.json")
}

fn default_window_width() -> u32 {
    1920
}

fn default_window_height() -> u32 {
    1080
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_session_check_timeout_seconds() -> u64 {
    5
}

fn default_email_label() -> String {
    "Email".to_string()
}

fn default_password_label() -> String {
    "Password".to_string()
}

fn default_submit_selector() -> String {
    "button[type='submit']".to_string()
}

fn default_nav_steps() -> Vec<NavStep> {
    vec![
        NavStep::new(NavAction::GotoIfElsewhere, default_data_url()),
        NavStep::new(NavAction::ClickButton, "Menu"),
        NavStep::new(NavAction::ClickText, "Data Management"),
        NavStep::new(NavAction::ClickText, "Inventory"),
        NavStep::new(NavAction::ClickText, "View All Products"),
        NavStep::new(NavAction::ClickButton, "Load Product Table"),
        NavStep::new(NavAction::WaitFor, default_container_selector()),
    ]
}

fn default_container_selector() -> String {
    "div.infinite-table".to_string()
}

fn default_table_selector() -> String {
    "table".to_string()
}

fn default_rating_column() -> String {
    "Rating".to_string()
}

fn default_rating_selector() -> String {
    "span".to_string()
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_collector_timeout_seconds() -> u64 {
    300
}

impl HarvestConfig {
    /// Load configuration from `path`, or use defaults if it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| HarvestError::Config(format!("Failed to parse config file: {}", e)))
    }

    /// Write the default configuration to `path`
    pub fn write_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&Self::default())
            .map_err(|e| HarvestError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject settings that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.navigation.steps.is_empty() {
            return Err(HarvestError::Config(
                "navigation.steps must contain at least one step".to_string(),
            ));
        }
        if self.table.container_selector.trim().is_empty() {
            return Err(HarvestError::Config(
                "table.container_selector must not be empty".to_string(),
            ));
        }
        if self.collector.timeout_seconds == 0 {
            return Err(HarvestError::Config(
                "collector.timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            post_login_url: default_post_login_url(),
            data_url: default_data_url(),
            signed_in_text: default_signed_in_text(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
            output_file: default_output_file(),
            credentials_file: default_credentials_file(),
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_width: default_window_width(),
            window_height: default_window_height(),
            user_agent: None,
            timeout_seconds: default_timeout_seconds(),
            session_check_timeout_seconds: default_session_check_timeout_seconds(),
        }
    }
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email_label: default_email_label(),
            password_label: default_password_label(),
            submit_selector: default_submit_selector(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            steps: default_nav_steps(),
        }
    }
}

impl Default for TableSelectors {
    fn default() -> Self {
        Self {
            container_selector: default_container_selector(),
            table_selector: default_table_selector(),
            rating_column: default_rating_column(),
            rating_selector: default_rating_selector(),
        }
    }
}

impl Default for CollectorSettings {
    fn default() -> Self {
        Self {
            settle_ms: default_settle_ms(),
            timeout_seconds: default_collector_timeout_seconds(),
        }
    }
}
