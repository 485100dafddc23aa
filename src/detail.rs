//! Level page parsing and per-level enrichment.

use scraper::{ElementRef, Html, Selector};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::extract::stripped_text;
use crate::traits::{RenderSession, WaitUntil};
use crate::types::{Level, LevelDetails, LevelSummary};

/// Reads label/value pairs off a level page.
pub struct DetailParser {
    label_selector: Selector,
}

impl DetailParser {
    pub fn new(label_selector: &str) -> Result<Self, CrawlerError> {
        let label_selector = Selector::parse(label_selector).map_err(|e| {
            CrawlerError::Config(format!("detail label selector {}: {}", label_selector, e))
        })?;
        Ok(Self { label_selector })
    }

    /// Unknown labels and labels without a value sibling are ignored. An
    /// object count that is not a number is an error.
    pub fn parse(&self, html: &str) -> Result<LevelDetails, CrawlerError> {
        let document = Html::parse_document(html);
        let mut details = LevelDetails::default();

        for label in document.select(&self.label_selector) {
            let Some(value) = next_paragraph(&label) else {
                continue;
            };
            let label_text = stripped_text(label).to_lowercase();
            let value_text = stripped_text(value);

            if label_text.contains("length") {
                details.length = Some(value_text);
            } else if label_text.contains("objects") {
                let digits = value_text.replace(',', "");
                let objects = digits.parse::<u64>().map_err(|e| {
                    CrawlerError::Extraction(format!("object count {value_text:?}: {e}"))
                })?;
                details.objects = Some(objects);
            } else if label_text.contains("version") {
                details.version = Some(value_text);
            }
        }

        Ok(details)
    }
}

fn next_paragraph<'a>(label: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    label
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "p")
}

/// Result of visiting every level page.
#[derive(Debug)]
pub struct Enrichment {
    pub levels: Vec<Level>,
    /// Ranks whose page could not be read; their detail fields stay empty.
    pub skipped: Vec<u64>,
}

pub struct DetailEnricher<'a> {
    config: &'a CrawlerConfig,
    parser: DetailParser,
}

impl<'a> DetailEnricher<'a> {
    pub fn new(config: &'a CrawlerConfig) -> Result<Self, CrawlerError> {
        Ok(Self {
            config,
            parser: DetailParser::new(&config.detail_label_selector)?,
        })
    }

    /// Visits each level in order. A failing page never aborts the batch.
    pub async fn enrich<S>(&self, session: &mut S, summaries: Vec<LevelSummary>) -> Enrichment
    where
        S: RenderSession + ?Sized,
    {
        info!("Collecting details for {} levels...", summaries.len());
        let total = summaries.len();
        let mut levels = Vec::with_capacity(total);
        let mut skipped = Vec::new();

        for (i, summary) in summaries.into_iter().enumerate() {
            info!("[{}/{}] Loading #{} {}", i + 1, total, summary.rank, summary.name);

            let fetched = self.fetch_details(session, &summary.link).await;
            match fetched {
                Ok(details) => levels.push(Level::from(summary).with_details(details)),
                Err(e) => {
                    if e.is_timeout() {
                        warn!("Timed out loading level #{}, skipping: {}", summary.rank, e);
                    } else {
                        warn!("Failed to process level #{}, skipping: {}", summary.rank, e);
                    }
                    skipped.push(summary.rank);
                    levels.push(Level::from(summary));
                }
            }
        }

        if !skipped.is_empty() {
            warn!("{} levels left without details: {:?}", skipped.len(), skipped);
        }
        Enrichment { levels, skipped }
    }

    async fn fetch_details<S>(&self, session: &mut S, link: &str) -> Result<LevelDetails, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        session
            .open(link, WaitUntil::DomContentLoaded, self.config.page_load_timeout)
            .await?;
        session
            .wait_for_selector(
                &self.config.detail_label_selector,
                self.config.detail_selector_timeout,
            )
            .await?;
        // animations may still be filling in values
        sleep(self.config.detail_settle_delay).await;
        let html = session.content().await?;
        self.parser.parse(&html)
    }
}
