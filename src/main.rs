use std::process::ExitCode;

use demonlist_crawler::{CrawlRequest, CrawlerConfig, CrawlerService};
use tower::Service;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,demonlist_crawler=debug")),
        )
        .init();

    let config = match CrawlerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut service = CrawlerService::new();
    match service.call(CrawlRequest::from(config)).await {
        Ok(report) => {
            info!(
                "Saved {} levels to {} ({} cards harvested)",
                report.levels.len(),
                report.output_path.display(),
                report.harvested_cards
            );
            if !report.skipped_ranks.is_empty() {
                info!("Levels without details: {:?}", report.skipped_ranks);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Crawl failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
