//! Unified error types for tabharvest

use thiserror::Error;

/// Unified error type for all harvest operations
#[derive(Error, Debug)]
pub enum HarvestError {
    // Extraction errors
    #[error("Target row count unavailable: {0}")]
    TargetCountUnavailable(String),

    #[error("Extraction aborted: {0}")]
    ExtractionAborted(String),

    #[error("Extraction timed out after {0}s")]
    ExtractionTimedOut(u64),

    // Session errors
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Session error: {0}")]
    Session(String),

    // Browser errors
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(String),
}

impl HarvestError {
    /// Process exit code for this error kind
    ///
    /// Each fatal condition gets its own code so wrapper scripts can decide
    /// whether a rerun is worthwhile.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TargetCountUnavailable(_) => 3,
            Self::ExtractionAborted(_) => 4,
            Self::ExtractionTimedOut(_) => 5,
            Self::MissingCredentials(_) => 6,
            Self::Session(_) => 7,
            Self::Browser(_) | Self::ElementNotFound { .. } | Self::ScreenshotFailed(_) => 8,
            Self::Navigation(_) => 9,
            Self::Config(_) => 10,
            Self::Io(_) | Self::Serialization(_) | Self::Other(_) => 1,
        }
    }
}

/// Result type alias using HarvestError
pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_distinct() {
        let target = HarvestError::TargetCountUnavailable("no status".to_string());
        let aborted = HarvestError::ExtractionAborted("no status".to_string());
        assert_ne!(target.to_string(), aborted.to_string());
        assert!(target.to_string().starts_with("Target row count unavailable"));
        assert!(aborted.to_string().starts_with("Extraction aborted"));
    }

    #[test]
    fn test_exit_codes_distinguish_fatal_kinds() {
        let codes = [
            HarvestError::TargetCountUnavailable(String::new()).exit_code(),
            HarvestError::ExtractionAborted(String::new()).exit_code(),
            HarvestError::ExtractionTimedOut(10).exit_code(),
            HarvestError::MissingCredentials(String::new()).exit_code(),
        ];
        let mut unique = codes.to_vec();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), codes.len());
        assert!(codes.iter().all(|c| *c != 0));
    }
}
