//! # Page-Crawler entry point
//!
//! Runs the crawl once: open the base URL, optionally download one image,
//! extract items with the configured selector and print them as JSON.
//!
//! ## Environment
//! - `CRAWLER_CONFIG`: TOML file loaded before the variables below
//! - `CRAWLER_BASE_URL`, `CRAWLER_SELECTOR`: what to crawl
//! - `CRAWLER_IMAGE_URL`, `CRAWLER_IMAGE_NAME`, `CRAWLER_DOWNLOAD_DIR`: optional image download
//! - `CRAWLER_CDP_ENDPOINT`: connect to a running browser instead of launching one
//! - `RUST_LOG`: log filter (falls back to `CRAWLER_LOG_LEVEL`, default `info`)

use anyhow::Context;
use page_crawler::{
    config::Config,
    extractor::{DiagnosticSink, ExtractedItem, PageExtractor, TracingSink},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout carries only the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Page-Crawler v{}", page_crawler::VERSION);
    info!("Crawling {} for '{}'", config.base_url, config.item_selector);

    let sink: Arc<dyn DiagnosticSink> = Arc::new(TracingSink);
    let extractor = PageExtractor::initialize(config.clone(), sink)
        .await
        .context("browser initialization failed")?;

    let outcome = run(&extractor, &config).await;

    // Close on every path before reporting the outcome
    if let Err(e) = extractor.close().await {
        error!("Failed to close browser: {}", e);
    }

    let items = outcome.context("crawl failed")?;
    println!("{}", serde_json::to_string_pretty(&items)?);

    info!("Crawl finished with {} items", items.len());
    Ok(())
}

async fn run(extractor: &PageExtractor, config: &Config) -> page_crawler::Result<Vec<ExtractedItem>> {
    extractor.navigate_to_base().await?;

    if let Some((url, name)) = config.image_download() {
        let path = extractor.download_resource(url, name).await?;
        info!("Image saved to {}", path.display());
    }

    extractor.extract_items(&config.item_selector).await
}
