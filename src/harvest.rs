//! Adaptive infinite-scroll harvesting.
//!
//! The list has no end marker, so completion is inferred: the card count has
//! not grown across `max_no_new_attempts` consecutive wait cycles, each of
//! them followed by a reanimation nudge.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::error::CrawlerError;
use crate::traits::RenderSession;

const SCROLL_TO_BOTTOM: &str = "window.scrollBy(0, document.body.scrollHeight);";
/// How far reanimation scrolls back up, in px.
const REANIMATE_OFFSET_PX: u32 = 500;
const REANIMATE_UP_PAUSE: Duration = Duration::from_millis(500);
const REANIMATE_DOWN_PAUSE: Duration = Duration::from_secs(1);

pub struct ScrollHarvester<'a> {
    config: &'a CrawlerConfig,
    count_script: String,
}

impl<'a> ScrollHarvester<'a> {
    pub fn new(config: &'a CrawlerConfig) -> Self {
        // JSON string literal is also a valid JS string literal.
        let selector = serde_json::Value::from(config.card_selector.as_str());
        Self {
            config,
            count_script: format!("document.querySelectorAll({selector}).length"),
        }
    }

    /// Scrolls until the list stops growing and returns the final card count.
    pub async fn harvest<S>(&self, session: &mut S) -> Result<usize, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        info!("Starting adaptive scroll to load every card...");
        let mut previous = self.card_count(session).await?;
        let mut stalls = 0u32;
        let mut rounds = 0u32;

        while stalls < self.config.max_no_new_attempts {
            if self.config.max_scroll_rounds.is_some_and(|limit| rounds >= limit) {
                warn!(
                    "List still growing after {} scroll rounds ({} cards), giving up",
                    rounds, previous
                );
                return Err(CrawlerError::ScrollLimit {
                    rounds,
                    cards: previous,
                });
            }
            rounds += 1;

            for _ in 0..self.config.fast_scrolls_per_step {
                session.evaluate(SCROLL_TO_BOTTOM).await?;
                sleep(self.config.fast_scroll_delay).await;
            }

            match self.wait_for_growth(session, previous).await? {
                Some(count) => {
                    info!("Cards found: {}", count);
                    previous = count;
                    stalls = 0;
                }
                None => {
                    stalls += 1;
                    info!(
                        "No new cards ({}/{})",
                        stalls, self.config.max_no_new_attempts
                    );
                    self.reanimate(session).await?;
                }
            }
        }

        info!("Scroll finished after {} rounds, {} cards loaded", rounds, previous);
        Ok(previous)
    }

    /// One bounded wait cycle. Returns the new count as soon as it exceeds
    /// `previous`, or `None` once `max_wait_for_new` has elapsed.
    async fn wait_for_growth<S>(
        &self,
        session: &mut S,
        previous: usize,
    ) -> Result<Option<usize>, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        let start = Instant::now();
        while start.elapsed() < self.config.max_wait_for_new {
            sleep(self.config.scroll_pause).await;
            let count = self.card_count(session).await?;
            if count > previous {
                return Ok(Some(count));
            }
        }
        Ok(None)
    }

    /// Lazy loaders can detach their scroll observers after sitting idle at
    /// the same position; moving away and back re-arms them.
    async fn reanimate<S>(&self, session: &mut S) -> Result<(), CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        debug!("Lazy loading looks idle, nudging the page");
        session
            .evaluate(&format!("window.scrollBy(0, -{REANIMATE_OFFSET_PX});"))
            .await?;
        sleep(REANIMATE_UP_PAUSE).await;
        session.evaluate(SCROLL_TO_BOTTOM).await?;
        sleep(REANIMATE_DOWN_PAUSE).await;
        Ok(())
    }

    async fn card_count<S>(&self, session: &mut S) -> Result<usize, CrawlerError>
    where
        S: RenderSession + ?Sized,
    {
        let value = session.evaluate(&self.count_script).await?;
        value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| CrawlerError::JavaScript(format!("card count is not a number: {value}")))
    }
}
