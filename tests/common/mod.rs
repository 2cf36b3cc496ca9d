//! Common test utilities
//!
//! Shared helpers for the integration tests.

#![allow(dead_code)]

use page_crawler::config::Config;
use page_crawler::extractor::{MemorySink, PageExtractor};
use page_crawler::session::{BrowserContext, BrowserContextImpl, BrowserOptions};
use std::sync::Arc;

/// Config that connects to an already running browser instead of launching one
pub fn connect_config(ws_endpoint: &str) -> Config {
    Config {
        cdp_endpoint: Some(ws_endpoint.to_string()),
        navigation_timeout_ms: 5_000,
        ..Default::default()
    }
}

/// Connect a browser context to `ws_endpoint`
pub async fn connect_browser(
    ws_endpoint: &str,
) -> Result<Arc<dyn BrowserContext>, Box<dyn std::error::Error>> {
    let options = BrowserOptions {
        cdp_endpoint: Some(ws_endpoint.to_string()),
        ..Default::default()
    };

    let browser = BrowserContextImpl::launch(options).await?;
    Ok(Arc::new(browser))
}

/// Initialize an extractor against `ws_endpoint` with an in-memory diagnostic sink
pub async fn connect_extractor(
    ws_endpoint: &str,
) -> Result<(PageExtractor, Arc<MemorySink>), Box<dyn std::error::Error>> {
    let sink = Arc::new(MemorySink::new());
    let extractor = PageExtractor::initialize(connect_config(ws_endpoint), sink.clone()).await?;
    Ok((extractor, sink))
}
