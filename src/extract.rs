//! Turns the harvested list markup into ordered level summaries.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::types::LevelSummary;

const RANK_PATTERN: &str = r"/classic/(\d+)";
const NAME_SELECTOR: &str = "p.font-bold";

/// Card labels look like `"12 - Some Level"`. Keeps what follows the first
/// `-`, or the whole label when there is none.
pub fn extract_name(label: &str) -> String {
    let label = label.trim();
    match label.split_once('-') {
        Some((_, name)) => name.trim().to_string(),
        None => label.to_string(),
    }
}

pub struct ListExtractor {
    base_url: Url,
    card_selector: Selector,
    name_selector: Selector,
    rank_pattern: Regex,
}

impl ListExtractor {
    pub fn new(config: &CrawlerConfig) -> Result<Self, CrawlerError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| CrawlerError::Config(format!("base url {}: {}", config.base_url, e)))?;
        let card_selector = Selector::parse(&config.card_selector).map_err(|e| {
            CrawlerError::Config(format!("card selector {}: {}", config.card_selector, e))
        })?;
        let name_selector = Selector::parse(NAME_SELECTOR)
            .map_err(|e| CrawlerError::Config(format!("name selector: {}", e)))?;
        let rank_pattern =
            Regex::new(RANK_PATTERN).map_err(|e| CrawlerError::Config(e.to_string()))?;

        Ok(Self {
            base_url,
            card_selector,
            name_selector,
            rank_pattern,
        })
    }

    /// Summaries sorted by rank. Cards without a numeric rank are skipped; of
    /// two cards sharing a rank the first in document order wins.
    pub fn extract(&self, html: &str) -> Vec<LevelSummary> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut levels = Vec::new();

        for card in document.select(&self.card_selector) {
            let Some(level) = self.parse_card(&card) else {
                continue;
            };
            if !seen.insert(level.rank) {
                warn!(
                    "Duplicate rank #{} ({}), keeping the first card",
                    level.rank, level.name
                );
                continue;
            }
            levels.push(level);
        }

        levels.sort_by_key(|level| level.rank);
        info!("Extracted {} levels from the main list", levels.len());
        levels
    }

    fn parse_card(&self, card: &ElementRef) -> Option<LevelSummary> {
        let href = card.value().attr("href").unwrap_or_default();
        let rank = self
            .rank_pattern
            .captures(href)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u64>().ok())?;
        let link = self.base_url.join(href).ok()?;

        let label = card
            .select(&self.name_selector)
            .next()
            .map(stripped_text)
            .unwrap_or_default();

        Some(LevelSummary {
            rank,
            name: extract_name(&label),
            link: link.to_string(),
        })
    }
}

/// Text nodes trimmed and concatenated, empty ones dropped.
pub(crate) fn stripped_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
