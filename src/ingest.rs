use crate::config::{self, IngestConfig};
use crate::runtime::fetcher::{build_client, Fetcher, HttpFetcher};
use crate::runtime::store;
use crate::sources::current::crawler::{CrawlLimits, Crawler};
use crate::sources::legislation::{download_acts, parse_listing};
use crate::sources::versioner::builder::TreeBuilder;
use crate::types::MetaNode;
use std::path::PathBuf;
use std::sync::Arc;

/// Build the full hierarchical tree from the document catalog and persist
/// it. Catalog problems are fatal; per-section failures are data gaps.
pub async fn run_catalog_build(config: &IngestConfig) -> Result<PathBuf, String> {
    let catalog = MetaNode::load(&config.catalog_path)?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(build_client()?));
    let builder = TreeBuilder::new(fetcher, config::VERSIONER_FULL_URL, config.fetch_width);

    tracing::info!(
        "Building {} {} from {}",
        catalog.kind.as_str(),
        catalog.identifier,
        config.catalog_path.display()
    );
    let tree = builder.build(&catalog).await;

    store::write_json(&config.output_dir.join("legislation"), "title8.json", &tree)
}

/// Walk the reading view's next-link chain and persist the accumulated
/// tree once the chain ends.
pub async fn run_regulation_crawl(config: &IngestConfig) -> Result<PathBuf, String> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(build_client()?));
    let limits = CrawlLimits::new(config.crawl_delay, config::ALLOWED_CRAWL_DOMAINS);
    let crawler = Crawler::new(fetcher, limits);

    let tree = crawler.crawl(config::REGULATIONS_SEED_URL).await?;

    store::write_json(
        &config.output_dir.join("legislation"),
        "title8-nested.json",
        &tree,
    )
}

/// Scrape the act listing and download every linked act body with the
/// bounded retry budget.
pub async fn run_legislation_download(config: &IngestConfig) -> Result<PathBuf, String> {
    let client = build_client()?;
    let fetcher = HttpFetcher::new(client.clone());

    let listing = fetcher.fetch(config::LEGISLATION_LISTING_URL).await?;
    let entries = parse_listing(&listing, config::LEGISLATION_LISTING_URL)?;
    if entries.is_empty() {
        return Err("Found no act rows on the legislation listing page.".to_string());
    }

    let dir = config.output_dir.join("legislation");
    std::fs::create_dir_all(&dir)
        .map_err(|e| format!("Failed to create directory {}: {e}", dir.display()))?;

    let downloaded = download_acts(&client, &entries, &dir, config.download_retries).await;
    tracing::info!("Downloaded {downloaded} of {} acts", entries.len());
    Ok(dir)
}
