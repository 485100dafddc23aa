//! Demonlist crawler
//!
//! - Scrolls the lazily loaded ranked list until it stops growing
//! - Extracts rank, name and link of every card
//! - Visits each level page for length, object count and version
//! - Writes the collection as a JSON array
//!
//! # Usage
//!
//! ```rust,ignore
//! use demonlist_crawler::{CrawlRequest, CrawlerService};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = CrawlerService::new();
//!
//!     let request = CrawlRequest::new()
//!         .with_output_path("./data/demonlist.json")
//!         .with_headless(true);
//!
//!     let report = service.call(request).await.unwrap();
//!     println!("levels: {}", report.levels.len());
//! }
//! ```
//!
//! # Driving a session directly
//!
//! ```rust,ignore
//! use demonlist_crawler::{ChromeSession, CrawlerConfig, DemonlistCrawler};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = CrawlerConfig::from_env().unwrap();
//!     let session = ChromeSession::launch(&config).await.unwrap();
//!     let report = DemonlistCrawler::new(&config).run(session).await.unwrap();
//!     println!("skipped: {:?}", report.skipped_ranks);
//! }
//! ```

pub mod chrome;
pub mod config;
pub mod detail;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod pipeline;
pub mod service;
pub mod store;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_support;

pub use chrome::ChromeSession;
pub use config::CrawlerConfig;
pub use detail::{DetailEnricher, DetailParser, Enrichment};
pub use error::CrawlerError;
pub use extract::{extract_name, ListExtractor};
pub use harvest::ScrollHarvester;
pub use pipeline::{CrawlReport, DemonlistCrawler};
pub use service::{CrawlRequest, CrawlerService};
pub use store::{load_levels, save_levels};
pub use traits::{RenderSession, WaitUntil};
pub use types::{Level, LevelDetails, LevelSummary};
