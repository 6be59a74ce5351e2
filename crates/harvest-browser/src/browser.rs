//! Browser lifecycle management using Chrome DevTools Protocol

use crate::error::{BrowserError, Result};
use harvest_core::config::BrowserSettings;
use harvest_core::StoredCookie;
use headless_chrome::protocol::cdp::Network::CookieParam;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Long login waits must not trip the CDP idle shutdown
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(600);

/// How often URL waits re-check the tab
const URL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Active browser session with Chrome DevTools Protocol
pub struct BrowserSession {
    /// Underlying browser instance (kept alive for tab lifetime)
    #[allow(dead_code)]
    browser: Browser,
    /// The single tab every step runs in
    tab: Arc<Tab>,
    /// Default wait for elements and URLs
    timeout: Duration,
}

impl BrowserSession {
    /// Launch browser with the given settings
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            settings.headless, settings.window_width, settings.window_height
        );

        let mut launch_options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some((settings.window_width, settings.window_height)))
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .build()
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        let user_agent_arg: Option<String> = settings
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));
        if let Some(ref ua_arg) = user_agent_arg {
            launch_options.args.push(OsStr::new(ua_arg));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;

        info!("Browser launched successfully");

        Ok(Self {
            browser,
            tab,
            timeout: Duration::from_secs(settings.timeout_seconds),
        })
    }

    /// Connect to an existing browser instance
    ///
    /// # Arguments
    /// * `port` - Chrome DevTools Protocol port (typically 9222)
    pub async fn connect(port: u16, settings: &BrowserSettings) -> Result<Self> {
        info!("Connecting to existing browser on port {}", port);

        let browser = Browser::connect(format!("http://127.0.0.1:{}", port))
            .map_err(|e| BrowserError::Browser(format!("Failed to connect to browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;

        info!("Connected to browser successfully");

        Ok(Self {
            browser,
            tab,
            timeout: Duration::from_secs(settings.timeout_seconds),
        })
    }

    /// Navigate to a URL and wait for the load to finish
    pub async fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Navigation(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Navigation(format!("Navigation timeout for {}: {}", url, e)))?;

        debug!("Navigated to {}", url);
        Ok(())
    }

    /// Current URL of the tab
    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Wait for a CSS selector to match
    ///
    /// Uses the session timeout when `timeout` is `None`.
    pub async fn wait_for_element(&self, selector: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.timeout);
        debug!("Waiting for element: {} (timeout: {:?})", selector, timeout);

        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .map_err(|_e| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        Ok(())
    }

    /// Wait for an XPath expression to match
    pub async fn wait_for_xpath(&self, xpath: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.timeout);
        debug!("Waiting for xpath: {} (timeout: {:?})", xpath, timeout);

        self.tab
            .wait_for_xpath_with_custom_timeout(xpath, timeout)
            .map_err(|_e| BrowserError::ElementNotFound {
                selector: xpath.to_string(),
            })?;

        Ok(())
    }

    /// Click the first element matching a CSS selector
    pub async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .tab
            .wait_for_element_with_custom_timeout(selector, self.timeout)
            .map_err(|_e| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })?;

        element
            .click()
            .map_err(|e| BrowserError::Browser(format!("Failed to click {}: {}", selector, e)))?;
        Ok(())
    }

    /// Click the first element matching an XPath expression
    pub async fn click_xpath(&self, xpath: &str) -> Result<()> {
        let element = self
            .tab
            .wait_for_xpath_with_custom_timeout(xpath, self.timeout)
            .map_err(|_e| BrowserError::ElementNotFound {
                selector: xpath.to_string(),
            })?;

        element
            .click()
            .map_err(|e| BrowserError::Browser(format!("Failed to click {}: {}", xpath, e)))?;
        Ok(())
    }

    /// Focus the element matching an XPath expression and type `text` into it
    pub async fn type_into_xpath(&self, xpath: &str, text: &str) -> Result<()> {
        let element = self
            .tab
            .wait_for_xpath_with_custom_timeout(xpath, self.timeout)
            .map_err(|_e| BrowserError::ElementNotFound {
                selector: xpath.to_string(),
            })?;

        element
            .click()
            .and_then(|el| el.type_into(text))
            .map_err(|e| BrowserError::Browser(format!("Failed to type into {}: {}", xpath, e)))?;
        Ok(())
    }

    /// Poll until the tab's URL matches `expected`
    pub async fn wait_for_url(&self, expected: &str, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(self.timeout);
        let deadline = Instant::now() + timeout;
        debug!("Waiting for URL {} (timeout: {:?})", expected, timeout);

        loop {
            let current = self.current_url();
            if urls_match(&current, expected) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::Navigation(format!(
                    "Timed out waiting for {} (still at {})",
                    expected, current
                )));
            }
            tokio::time::sleep(URL_POLL_INTERVAL).await;
        }
    }

    /// Execute JavaScript in the page context
    ///
    /// # Returns
    /// JSON result from JavaScript execution
    pub async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value> {
        debug!("Evaluating JavaScript ({} bytes)", script.len());

        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::Browser(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate a script that ends in `JSON.stringify(...)` and decode it
    ///
    /// Stringifying in the page sidesteps remote object handles for arrays and
    /// objects.
    pub async fn evaluate_json<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.evaluate_script(script).await?;
        let text = value.as_str().ok_or_else(|| {
            BrowserError::Browser(format!("Script did not return a JSON string: {}", value))
        })?;
        Ok(serde_json::from_str(text)?)
    }

    /// All cookies visible to the tab
    pub async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self
            .tab
            .get_cookies()
            .map_err(|e| BrowserError::Browser(format!("Failed to read cookies: {}", e)))?;

        cookies
            .iter()
            .map(|c| -> Result<StoredCookie> {
                Ok(serde_json::from_value(serde_json::to_value(c)?)?)
            })
            .collect()
    }

    pub async fn set_cookies(&self, cookies: &[StoredCookie]) -> Result<()> {
        let params = cookies
            .iter()
            .map(|c| serde_json::from_value::<CookieParam>(cookie_param_json(c)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        debug!("Restoring {} cookies", params.len());
        self.tab
            .set_cookies(params)
            .map_err(|e| BrowserError::Browser(format!("Failed to set cookies: {}", e)))
    }

    /// Get reference to the active tab
    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }

    /// Close the browser session
    pub async fn close(self) -> Result<()> {
        info!("Closing browser session");
        // Browser will be dropped and cleaned up automatically
        Ok(())
    }
}

/// CDP `CookieParam` shape for a stored cookie
pub(crate) fn cookie_param_json(cookie: &StoredCookie) -> serde_json::Value {
    let mut param = serde_json::json!({
        "name": cookie.name,
        "value": cookie.value,
        "domain": cookie.domain,
        "path": cookie.path,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    if cookie.expires > 0.0 {
        param["expires"] = serde_json::json!(cookie.expires);
    }
    if let Some(same_site) = &cookie.same_site {
        param["sameSite"] = serde_json::json!(same_site);
    }
    param
}

/// URL equality ignoring a trailing slash
pub(crate) fn urls_match(current: &str, expected: &str) -> bool {
    current.trim_end_matches('/') == expected.trim_end_matches('/')
}
