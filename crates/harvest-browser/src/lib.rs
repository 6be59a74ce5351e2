//! Browser automation for tabharvest
//!
//! This crate drives a Chrome/Chromium tab over the Chrome DevTools Protocol
//! (CDP) to get from a cold start to a fully rendered product table.
//!
//! # Features
//!
//! - **Browser Management**: Launch and control Chrome/Chromium browsers
//! - **Session Reuse**: Restore saved cookies and local storage, log in only when needed
//! - **Navigation**: Replay a configured sequence of clicks to reach the data view
//! - **Table View**: Read, scroll and settle the infinite-scroll table for the collector
//! - **Failure Screenshots**: Full-page PNG capture when a run goes wrong
//!
//! # Example
//!
//! ```no_run
//! use harvest_browser::{BrowserSession, BrowserTableView, Navigator, SessionManager};
//! use harvest_collector::IncrementalCollector;
//! use harvest_core::{FileCredentials, HarvestConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::default();
//!     let session = BrowserSession::launch(&config.browser).await?;
//!
//!     let credentials = FileCredentials::new(&config.paths.credentials_file);
//!     SessionManager::new(&config).establish(&session, &credentials).await?;
//!     Navigator::new(&config.navigation).run(&session).await?;
//!
//!     let view = BrowserTableView::new(&session, config.table.clone());
//!     let harvest = IncrementalCollector::new(view, &config.collector).run().await?;
//!     println!("Collected {} rows", harvest.rows.len());
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium browser installed
//! - For connecting to existing browser: `chrome --remote-debugging-port=9222`
//!
//! # Architecture
//!
//! - [`browser`]: Browser lifecycle and tab operations
//! - [`session`]: Saved-state restore, verification and login
//! - [`navigator`]: Step-by-step UI navigation
//! - [`locator`]: XPath builders for text-addressed elements
//! - [`table`]: [`harvest_collector::TableView`] over the live table
//! - [`screenshot`]: Screenshot capture
//! - [`error`]: Error types for browser operations

pub mod browser;
pub mod error;
pub mod locator;
pub mod navigator;
pub mod screenshot;
pub mod session;
pub mod table;

// Re-export commonly used types
pub use browser::BrowserSession;
pub use error::{BrowserError, Result};
pub use navigator::{Navigator, StepPlan};
pub use session::{SessionManager, SessionOutcome};
pub use table::BrowserTableView;
