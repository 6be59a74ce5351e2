//! Browser automation error types - re-exports unified HarvestError from harvest-core
//!
//! Browser failures use the unified HarvestError type:
//! - Browser(String) - launch, CDP and script evaluation failures
//! - ElementNotFound - selector or XPath never appeared
//! - Navigation(String) / Session(String) - failed UI steps and logins
//!
//! Error messages should be descriptive and include context about the operation that failed.

pub use harvest_core::{HarvestError, Result};

pub type BrowserError = HarvestError;
