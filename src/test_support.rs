//! Scripted in-memory `RenderSession` for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CrawlerError;
use crate::traits::{RenderSession, WaitUntil};

#[derive(Debug, Default)]
pub(crate) struct FakeSession {
    /// Card counts returned by successive count queries; the last one repeats.
    counts: VecDeque<usize>,
    last_count: usize,
    /// url -> markup
    pages: HashMap<String, String>,
    /// Pages whose selector wait times out.
    stalled_pages: HashSet<String>,
    /// Pages whose navigation fails outright.
    broken_pages: HashSet<String>,
    fail_count_queries: bool,
    fail_close: bool,
    current: Option<String>,

    pub opened: Vec<String>,
    pub scripts: Vec<String>,
    pub closed: bool,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_counts(mut self, counts: &[usize]) -> Self {
        self.counts = counts.iter().copied().collect();
        self
    }

    pub fn with_page(mut self, url: &str, markup: &str) -> Self {
        self.pages.insert(url.to_string(), markup.to_string());
        self
    }

    pub fn with_stalled_page(mut self, url: &str) -> Self {
        self.stalled_pages.insert(url.to_string());
        self
    }

    pub fn with_broken_page(mut self, url: &str) -> Self {
        self.broken_pages.insert(url.to_string());
        self
    }

    pub fn with_failing_count_queries(mut self) -> Self {
        self.fail_count_queries = true;
        self
    }

    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn scripts_containing(&self, needle: &str) -> usize {
        self.scripts.iter().filter(|s| s.contains(needle)).count()
    }

    fn next_count(&mut self) -> usize {
        if let Some(count) = self.counts.pop_front() {
            self.last_count = count;
        }
        self.last_count
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn open(
        &mut self,
        url: &str,
        _wait_until: WaitUntil,
        _timeout: Duration,
    ) -> Result<(), CrawlerError> {
        self.opened.push(url.to_string());
        if self.broken_pages.contains(url) {
            return Err(CrawlerError::Navigation(format!("net::ERR_FAILED at {url}")));
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), CrawlerError> {
        let stalled = self
            .current
            .as_ref()
            .is_some_and(|url| self.stalled_pages.contains(url));
        if stalled {
            tokio::time::sleep(timeout).await;
            return Err(CrawlerError::SelectorTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, CrawlerError> {
        self.scripts.push(script.to_string());
        if script.contains("querySelectorAll") {
            if self.fail_count_queries {
                return Err(CrawlerError::JavaScript("Target closed".into()));
            }
            return Ok(Value::from(self.next_count()));
        }
        Ok(Value::Null)
    }

    async fn content(&mut self) -> Result<String, CrawlerError> {
        let url = self
            .current
            .as_ref()
            .ok_or_else(|| CrawlerError::Navigation("no page open".into()))?;
        Ok(self.pages.get(url).cloned().unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), CrawlerError> {
        self.closed = true;
        if self.fail_close {
            return Err(CrawlerError::BrowserClose("browser already gone".into()));
        }
        Ok(())
    }
}
