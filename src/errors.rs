use crate::types::{ResultSet, Subject};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Timed out after {timeout_ms}ms waiting for '{selector}' on {url}")]
    Timeout {
        url: String,
        selector: String,
        timeout_ms: u64,
    },

    #[error("Malformed page for '{subject}': field lists have unequal lengths (category={category}, percent={percent}, total={total})")]
    MalformedPage {
        subject: Subject,
        category: usize,
        percent: usize,
        total: usize,
    },

    #[error("Invalid selector '{0}'")]
    InvalidSelector(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Run aborted at subject '{subject}' with {} rows collected: {source}", .partial.len())]
    Aborted {
        subject: Subject,
        partial: ResultSet,
        source: Box<ScrapeError>,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

// Convert anyhow::Error to ScrapeError
impl From<anyhow::Error> for ScrapeError {
    fn from(err: anyhow::Error) -> Self {
        ScrapeError::AnyhowError(err.to_string())
    }
}

impl ScrapeError {
    pub fn from_any_error<E: std::fmt::Display>(err: E) -> Self {
        ScrapeError::ChromeError(err.to_string())
    }

    /// Errors scoped to a single subject's page. Everything else (launch,
    /// config, IO) means the run itself is broken.
    pub fn is_per_subject(&self) -> bool {
        matches!(
            self,
            ScrapeError::NavigationFailed(_)
                | ScrapeError::Timeout { .. }
                | ScrapeError::MalformedPage { .. }
                | ScrapeError::JavaScriptFailed(_)
                | ScrapeError::ChromeError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_subject_classification() {
        let timeout = ScrapeError::Timeout {
            url: "https://example.com/a".to_string(),
            selector: ".ready".to_string(),
            timeout_ms: 100,
        };
        assert!(timeout.is_per_subject());
        assert!(ScrapeError::NavigationFailed("dns".to_string()).is_per_subject());
        assert!(!ScrapeError::LaunchFailed("no chrome".to_string()).is_per_subject());
        assert!(!ScrapeError::Configuration("bad".to_string()).is_per_subject());
    }

    #[test]
    fn test_aborted_message_counts_partial_rows() {
        let mut partial = ResultSet::new();
        partial.push(crate::types::ScorecardRow::new(
            Subject::new("alice"),
            "True",
            "80%",
            "5",
        ));
        let err = ScrapeError::Aborted {
            subject: Subject::new("bob"),
            partial,
            source: Box::new(ScrapeError::NavigationFailed("refused".to_string())),
        };
        let msg = err.to_string();
        assert!(msg.contains("'bob'"));
        assert!(msg.contains("1 rows"));
        assert!(msg.contains("refused"));
    }
}
