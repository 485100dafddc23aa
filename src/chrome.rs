//! Chrome DevTools backed `RenderSession`.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::traits::{RenderSession, WaitUntil};

const READY_STATE_POLL_INTERVAL: Duration = Duration::from_millis(200);
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    /// Launches the browser and opens a blank page.
    pub async fn launch(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        info!("Launching browser (headless: {})...", config.headless);

        let mut builder = BrowserConfig::builder()
            .window_size(1280, 800)
            .request_timeout(config.page_load_timeout);

        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        if !config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage");

        let browser_config = builder.build().map_err(CrawlerError::BrowserInit)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| CrawlerError::BrowserInit(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {:?}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlerError::BrowserInit(e.to_string()))?;

        info!("Browser ready");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    async fn ready_state(&self) -> Result<String, CrawlerError> {
        let state = self
            .page
            .evaluate("document.readyState")
            .await
            .map_err(|e| CrawlerError::JavaScript(e.to_string()))?;
        ready_state_of(state.into_value::<Value>().unwrap_or(Value::Null))
    }
}

fn ready_state_of(value: Value) -> Result<String, CrawlerError> {
    match value {
        Value::String(state) => Ok(state),
        other => Err(CrawlerError::JavaScript(format!(
            "document.readyState is not a string: {other}"
        ))),
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn open(
        &mut self,
        url: &str,
        wait_until: WaitUntil,
        timeout: Duration,
    ) -> Result<(), CrawlerError> {
        debug!("Opening {}", url);
        let start = Instant::now();
        let navigation_timeout = || CrawlerError::NavigationTimeout {
            url: url.to_string(),
            timeout,
        };

        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(CdpError::Timeout)) | Err(_) => return Err(navigation_timeout()),
            Ok(Err(e)) => return Err(CrawlerError::Navigation(format!("{}: {}", url, e))),
        }

        loop {
            let state = self.ready_state().await?;
            if wait_until.is_reached(&state) {
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(navigation_timeout());
            }
            sleep(READY_STATE_POLL_INTERVAL).await;
        }
    }

    async fn wait_for_selector(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), CrawlerError> {
        let start = Instant::now();
        loop {
            if self.page.find_element(selector).await.is_ok() {
                debug!("'{}' present after {:?}", selector, start.elapsed());
                return Ok(());
            }
            if start.elapsed() >= timeout {
                return Err(CrawlerError::SelectorTimeout {
                    selector: selector.to_string(),
                    timeout,
                });
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value, CrawlerError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CrawlerError::JavaScript(e.to_string()))?;
        // `undefined` has no JSON value
        Ok(result.into_value::<Value>().unwrap_or(Value::Null))
    }

    async fn content(&mut self) -> Result<String, CrawlerError> {
        self.page
            .content()
            .await
            .map_err(|e| CrawlerError::JavaScript(e.to_string()))
    }

    /// The handler task is stopped even when closing fails.
    async fn close(&mut self) -> Result<(), CrawlerError> {
        info!("Closing browser...");
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| CrawlerError::BrowserClose(e.to_string()));
        let exited = self
            .browser
            .wait()
            .await
            .map(|_| ())
            .map_err(|e| CrawlerError::BrowserClose(format!("waiting for exit: {}", e)));
        self.handler.abort();

        closed.and(exited)?;
        info!("Browser closed");
        Ok(())
    }
}
