use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CrawlerError;

/// Page lifecycle point that `open` waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitUntil {
    /// `document.readyState` has left `"loading"`.
    DomContentLoaded,
    /// `document.readyState` is `"complete"`.
    Load,
}

impl WaitUntil {
    pub fn is_reached(self, ready_state: &str) -> bool {
        match self {
            WaitUntil::DomContentLoaded => {
                ready_state == "interactive" || ready_state == "complete"
            }
            WaitUntil::Load => ready_state == "complete",
        }
    }
}

/// A live rendered page the crawler drives.
///
/// The pipeline owns the session and lends it to each stage in turn.
#[async_trait]
pub trait RenderSession: Send {
    /// Navigate and wait for `wait_until`. Fails with `NavigationTimeout`.
    async fn open(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), CrawlerError>;

    /// Fails with `SelectorTimeout`.
    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), CrawlerError>;

    async fn evaluate(&mut self, script: &str) -> Result<Value, CrawlerError>;

    /// Current rendered markup.
    async fn content(&mut self) -> Result<String, CrawlerError>;

    /// Release browser resources.
    async fn close(&mut self) -> Result<(), CrawlerError>;
}
