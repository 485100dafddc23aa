use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrawlerError {
    #[error("browser init error: {0}")]
    BrowserInit(String),

    #[error("navigation error: {0}")]
    Navigation(String),

    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout { url: String, timeout: Duration },

    #[error("selector '{selector}' did not appear within {timeout:?}")]
    SelectorTimeout { selector: String, timeout: Duration },

    #[error("list still growing after {rounds} scroll rounds ({cards} cards)")]
    ScrollLimit { rounds: u32, cards: usize },

    #[error("browser close error: {0}")]
    BrowserClose(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("extraction error: {0}")]
    Extraction(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("file error: {0}")]
    FileIO(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CrawlerError {
    /// Bounded-wait expiry rather than a hard fault.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            CrawlerError::NavigationTimeout { .. } | CrawlerError::SelectorTimeout { .. }
        )
    }
}
