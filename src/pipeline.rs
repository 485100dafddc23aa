//! Full crawl: list page, scroll harvest, extraction, enrichment, save.

use std::path::PathBuf;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::CrawlerConfig;
use crate::detail::DetailEnricher;
use crate::error::CrawlerError;
use crate::extract::ListExtractor;
use crate::harvest::ScrollHarvester;
use crate::store::save_levels;
use crate::traits::{RenderSession, WaitUntil};
use crate::types::Level;

/// Outcome of a finished run.
#[derive(Debug)]
pub struct CrawlReport {
    pub output_path: PathBuf,
    pub levels: Vec<Level>,
    /// Card count at the end of scrolling.
    pub harvested_cards: usize,
    pub skipped_ranks: Vec<u64>,
}

struct Crawl {
    levels: Vec<Level>,
    harvested_cards: usize,
    skipped_ranks: Vec<u64>,
}

pub struct DemonlistCrawler<'a> {
    config: &'a CrawlerConfig,
}

impl<'a> DemonlistCrawler<'a> {
    pub fn new(config: &'a CrawlerConfig) -> Self {
        Self { config }
    }

    /// Runs the crawl, closes the session, then writes the dataset.
    ///
    /// Nothing is written when the crawl fails.
    pub async fn run<S>(&self, mut session: S) -> Result<CrawlReport, CrawlerError>
    where
        S: RenderSession,
    {
        let crawl = self.crawl_inner(&mut session).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close session: {}", e);
        }
        let crawl = crawl?;

        save_levels(&self.config.output_path, &crawl.levels)?;
        if let Some(mirror) = &self.config.mirror_url {
            info!("Mirror URL: {}", mirror);
        }

        Ok(CrawlReport {
            output_path: self.config.output_path.clone(),
            levels: crawl.levels,
            harvested_cards: crawl.harvested_cards,
            skipped_ranks: crawl.skipped_ranks,
        })
    }

    /// Collects every level without touching the output file.
    pub async fn crawl<S>(&self, session: &mut S) -> Result<Vec<Level>, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        Ok(self.crawl_inner(session).await?.levels)
    }

    async fn crawl_inner<S>(&self, session: &mut S) -> Result<Crawl, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        let extractor = ListExtractor::new(self.config)?;
        let enricher = DetailEnricher::new(self.config)?;

        self.open_list(session).await?;
        let harvested_cards = ScrollHarvester::new(self.config).harvest(session).await?;

        let html = session.content().await?;
        let summaries = extractor.extract(&html);

        let enrichment = enricher.enrich(session, summaries).await;
        info!(
            "Collected {} levels ({} without details)",
            enrichment.levels.len(),
            enrichment.skipped.len()
        );

        Ok(Crawl {
            levels: enrichment.levels,
            harvested_cards,
            skipped_ranks: enrichment.skipped,
        })
    }

    async fn open_list<S>(&self, session: &mut S) -> Result<(), CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        info!("Opening {}...", self.config.base_url);
        session
            .open(
                &self.config.base_url,
                WaitUntil::DomContentLoaded,
                self.config.page_load_timeout,
            )
            .await?;
        session
            .wait_for_selector(
                &self.config.list_container_selector,
                self.config.selector_timeout,
            )
            .await?;
        sleep(self.config.list_settle_delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::load_levels;
    use crate::test_support::FakeSession;

    const BASE: &str = "https://demonlist.org";

    fn list_page() -> String {
        let cards: String = [3, 1, 2]
            .iter()
            .map(|rank| {
                format!(
                    r#"<a href="/classic/{rank}"><p class="font-bold">{rank} - Level {rank}</p></a>"#
                )
            })
            .collect();
        format!(r#"<html><body><div class="grid">{cards}</div></body></html>"#)
    }

    fn detail_page(objects: &str) -> String {
        format!(
            r#"<html><body>
                <p class="font-bold">Length</p><p>1:45</p>
                <p class="font-bold">Objects</p><p>{objects}</p>
                <p class="font-bold">Version</p><p>2.2</p>
            </body></html>"#
        )
    }

    fn three_card_session() -> FakeSession {
        FakeSession::new()
            .with_counts(&[3])
            .with_page(BASE, &list_page())
            .with_page(&format!("{BASE}/classic/1"), &detail_page("1,000"))
            .with_stalled_page(&format!("{BASE}/classic/2"))
            .with_page(&format!("{BASE}/classic/3"), &detail_page("3,000"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_to_end_with_one_timed_out_page() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("data").join("demonlist.json");
        let config = CrawlerConfig::new(BASE).with_output_path(&output);

        let report = DemonlistCrawler::new(&config)
            .run(three_card_session())
            .await
            .unwrap();

        assert_eq!(report.harvested_cards, 3);
        assert_eq!(report.skipped_ranks, vec![2]);

        let saved = load_levels(&output).unwrap();
        let ranks: Vec<u64> = saved.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(saved.iter().filter(|l| !l.has_details()).count(), 1);
        assert!(!saved[1].has_details());
        assert_eq!(saved[0].objects, Some(1000));
        assert_eq!(saved[2].objects, Some(3000));
        assert_eq!(saved[2].link, "https://demonlist.org/classic/3");
        assert_eq!(report.levels, saved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_crawl_visits_pages_in_rank_order() {
        let config = CrawlerConfig::new(BASE);
        let mut session = three_card_session();

        let levels = DemonlistCrawler::new(&config)
            .crawl(&mut session)
            .await
            .unwrap();

        assert_eq!(levels.len(), 3);
        assert_eq!(
            session.opened,
            vec![
                BASE.to_string(),
                format!("{BASE}/classic/1"),
                format!("{BASE}/classic/2"),
                format!("{BASE}/classic/3"),
            ]
        );
        assert!(!session.closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_navigation_fault_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("demonlist.json");
        let config = CrawlerConfig::new(BASE).with_output_path(&output);
        let session = FakeSession::new().with_broken_page(BASE);

        let err = DemonlistCrawler::new(&config)
            .run(session)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlerError::Navigation(_)));
        assert!(!output.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_failure_still_saves() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("demonlist.json");
        let config = CrawlerConfig::new(BASE)
            .with_output_path(&output)
            .with_mirror_url("https://mirror.example/demonlist.json");

        let report = DemonlistCrawler::new(&config)
            .run(three_card_session().with_failing_close())
            .await
            .unwrap();

        assert_eq!(report.levels.len(), 3);
        assert_eq!(load_levels(&output).unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scroll_round_limit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("demonlist.json");
        let config = CrawlerConfig::new(BASE)
            .with_output_path(&output)
            .with_max_scroll_rounds(2);
        let counts: Vec<usize> = (1..=50).collect();
        let session = FakeSession::new()
            .with_counts(&counts)
            .with_page(BASE, &list_page());

        let err = DemonlistCrawler::new(&config)
            .run(session)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlerError::ScrollLimit { rounds: 2, .. }));
        assert!(!output.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_list_wait_timeout_is_fatal() {
        let config = CrawlerConfig::new(BASE);
        let mut session = FakeSession::new().with_stalled_page(BASE);

        let err = DemonlistCrawler::new(&config)
            .crawl(&mut session)
            .await
            .unwrap_err();

        assert!(matches!(err, CrawlerError::SelectorTimeout { .. }));
        assert_eq!(session.opened, vec![BASE.to_string()]);
    }
}
