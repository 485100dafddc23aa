use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::chrome::ChromeSession;
use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::pipeline::{CrawlReport, DemonlistCrawler};

/// Crawl request
#[derive(Debug, Clone, Default)]
pub struct CrawlRequest {
    config: CrawlerConfig,
}

impl CrawlRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.config.headless = headless;
        self
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }
}

impl From<CrawlerConfig> for CrawlRequest {
    fn from(config: CrawlerConfig) -> Self {
        Self { config }
    }
}

impl From<CrawlRequest> for CrawlerConfig {
    fn from(req: CrawlRequest) -> Self {
        req.config
    }
}

/// `tower::Service` that launches Chrome and runs one crawl per call.
#[derive(Debug, Clone, Default)]
pub struct CrawlerService {}

impl CrawlerService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<CrawlRequest> for CrawlerService {
    type Response = CrawlReport;
    type Error = CrawlerError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: CrawlRequest) -> Self::Future {
        info!("Crawl request received: base_url={}", req.config.base_url);

        Box::pin(async move {
            let config: CrawlerConfig = req.into();
            let session = ChromeSession::launch(&config).await?;

            let report = DemonlistCrawler::new(&config).run(session).await?;

            info!(
                "Crawl complete: path={:?}, levels={}, without details={}",
                report.output_path,
                report.levels.len(),
                report.skipped_ranks.len()
            );

            Ok(report)
        })
    }
}
