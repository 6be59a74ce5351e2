//! Screenshot capture using Chrome DevTools Protocol
//!
//! Used to leave a picture of the page behind when a run fails, which is
//! usually the quickest way to see which menu item or table never appeared.

use crate::browser::BrowserSession;
use crate::error::{BrowserError, Result};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use std::path::Path;
use tracing::{info, warn};

/// Capture the whole page as PNG bytes
pub async fn capture_full_page(session: &BrowserSession) -> Result<Vec<u8>> {
    session
        .tab()
        .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
        .map_err(|e| BrowserError::ScreenshotFailed(format!("CDP capture failed: {}", e)))
}

/// Capture the whole page and write it to `path`
pub async fn save_full_page(session: &BrowserSession, path: &Path) -> Result<()> {
    let data = capture_full_page(session).await?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, &data).await.map_err(|e| {
        BrowserError::ScreenshotFailed(format!("Failed to write {}: {}", path.display(), e))
    })?;

    info!("Screenshot stored: {} ({} bytes)", path.display(), data.len());
    Ok(())
}

/// Best-effort failure screenshot; problems are logged, never returned
pub async fn capture_on_failure(session: &BrowserSession, path: Option<&Path>) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = save_full_page(session, path).await {
        warn!("Could not capture failure screenshot: {}", e);
    }
}
