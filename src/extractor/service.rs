//! PageExtractor: one browser, one page, linear extraction pipeline
//!
//! Every operation reports to the injected `DiagnosticSink` and returns a
//! `Result`; the caller decides whether to continue after a failure.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::extractor::download::ImageDownloader;
use crate::extractor::sink::DiagnosticSink;
use crate::extractor::types::{ExtractedItem, PipelineState};
use crate::session::{
    BrowserContext, BrowserContextImpl, BrowserOptions, ElementRef, LoadState, NavigationOptions,
    NavigationResult, PageContext, PageOptions,
};
use crate::{Error, Result};

/// Browser-backed page extraction pipeline
#[derive(Debug)]
pub struct PageExtractor {
    config: Config,
    browser: Arc<dyn BrowserContext>,
    page: Arc<dyn PageContext>,
    downloader: ImageDownloader,
    sink: Arc<dyn DiagnosticSink>,
    state: Mutex<PipelineState>,
}

impl PageExtractor {
    /// Launch (or connect to) a browser and open the working page
    pub async fn initialize(config: Config, sink: Arc<dyn DiagnosticSink>) -> Result<Self> {
        let browser = match BrowserContextImpl::launch(browser_options(&config)).await {
            Ok(browser) => Arc::new(browser) as Arc<dyn BrowserContext>,
            Err(e) => {
                sink.error(&format!("Error in init: {}", e));
                return Err(e);
            }
        };

        Self::from_browser(config, browser, sink).await
    }

    /// Build the pipeline over an already running browser
    pub async fn from_browser(
        config: Config,
        browser: Arc<dyn BrowserContext>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Result<Self> {
        let page = match browser.create_page(page_options(&config)).await {
            Ok(page) => page,
            Err(e) => {
                sink.error(&format!("Error in init: {}", e));
                if let Err(close_err) = browser.close().await {
                    sink.warn(&format!("Error closing browser after failed init: {}", close_err));
                }
                return Err(e);
            }
        };
        page.set_default_navigation_timeout(config.navigation_timeout_ms);

        sink.info("Browser initialized");

        Ok(Self {
            downloader: ImageDownloader::new(config.download_dir.clone()),
            config,
            browser,
            page,
            sink,
            state: Mutex::new(PipelineState::Initialized),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = state;
    }

    fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.state() == PipelineState::Closed {
            let err = Error::session_closed(format!("{} called after close", operation));
            self.sink.error(&err.to_string());
            return Err(err);
        }
        Ok(())
    }

    /// Load `url` and wait until the network is idle
    pub async fn navigate(&self, url: &str) -> Result<NavigationResult> {
        self.ensure_open("navigate")?;

        let options = NavigationOptions {
            timeout: self.page.default_navigation_timeout(),
            wait_until: LoadState::NetworkIdle,
        };

        match self.page.navigate(url, options).await {
            Ok(result) => {
                self.set_state(PipelineState::Navigated);
                self.sink.info(&format!("Navigated to {}", url));
                Ok(result)
            }
            Err(e) => {
                self.sink.error(&format!("Error navigating to {}: {}", url, e));
                Err(e)
            }
        }
    }

    /// Load the configured base URL
    pub async fn navigate_to_base(&self) -> Result<NavigationResult> {
        let base_url = self.config.base_url.clone();
        self.navigate(&base_url).await
    }

    /// Replace the current document with `html`
    pub async fn set_content(&self, html: &str) -> Result<()> {
        self.ensure_open("set_content")?;

        match self.page.set_content(html).await {
            Ok(()) => {
                self.set_state(PipelineState::Navigated);
                Ok(())
            }
            Err(e) => {
                self.sink.error(&format!("Error setting content: {}", e));
                Err(e)
            }
        }
    }

    /// URL of the current document
    pub async fn current_url(&self) -> Result<String> {
        self.ensure_open("current_url")?;

        self.page.url().await.map_err(|e| {
            self.sink.error(&format!("Error reading current URL: {}", e));
            e
        })
    }

    /// Title/href pairs for every element matching `selector`, in document order.
    /// No match is an empty list; a failed query or element read is an error.
    pub async fn extract_items(&self, selector: &str) -> Result<Vec<ExtractedItem>> {
        self.ensure_open("extract_items")?;

        match self.collect_items(selector).await {
            Ok(items) => Ok(items),
            Err(e) => {
                self.sink.error(&format!("Error getting items: {}", e));
                Err(e)
            }
        }
    }

    async fn collect_items(&self, selector: &str) -> Result<Vec<ExtractedItem>> {
        let elements = self.page.query_selector_all(selector).await?;
        self.sink.info(&format!("Found {} items", elements.len()));

        let mut items = Vec::with_capacity(elements.len());
        for element in &elements {
            let title = self.text_content(element.as_ref()).await?;
            let href = self.attribute(element.as_ref(), "href").await?;
            items.push(ExtractedItem { title, href });
        }

        self.sink.info(&serde_json::to_string(&items)?);
        Ok(items)
    }

    /// Trimmed `textContent` of `element`
    pub async fn text_content(&self, element: &dyn ElementRef) -> Result<String> {
        self.ensure_open("text_content")?;

        match element.text_content().await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) => {
                self.sink.error(&format!("Error getting text content: {}", e));
                Err(e)
            }
        }
    }

    /// Trimmed `innerHTML` of `element`
    pub async fn html_content(&self, element: &dyn ElementRef) -> Result<String> {
        self.ensure_open("html_content")?;

        match element.inner_html().await {
            Ok(html) => Ok(html.trim().to_string()),
            Err(e) => {
                self.sink.error(&format!("Error getting HTML content: {}", e));
                Err(e)
            }
        }
    }

    /// Attribute `name` of `element`, untouched; `None` when absent
    pub async fn attribute(&self, element: &dyn ElementRef, name: &str) -> Result<Option<String>> {
        self.ensure_open("attribute")?;

        element.get_attribute(name).await.map_err(|e| {
            self.sink.error(&format!("Error getting attribute {}: {}", name, e));
            e
        })
    }

    /// First element matching `selector`
    pub async fn find_element(&self, selector: &str) -> Result<Option<Arc<dyn ElementRef>>> {
        self.ensure_open("find_element")?;

        self.page.query_selector(selector).await.map_err(|e| {
            self.sink.error(&format!("Error querying {}: {}", selector, e));
            e
        })
    }

    /// Download `url` to `<download_dir>/<name>.jpg`
    pub async fn download_resource(&self, url: &str, name: &str) -> Result<PathBuf> {
        self.ensure_open("download_resource")?;

        match self.downloader.download(url, name).await {
            Ok(path) => {
                self.sink.info(&format!("Downloaded {} to {}", url, path.display()));
                Ok(path)
            }
            Err(e) => {
                self.sink.error(&format!("Error fetching image from {}: {}", url, e));
                Err(e)
            }
        }
    }

    /// Release the page and the browser. Calling it again is a no-op.
    pub async fn close(&self) -> Result<()> {
        if self.state() == PipelineState::Closed {
            return Ok(());
        }
        self.set_state(PipelineState::Closed);

        if let Err(e) = self.page.close().await {
            self.sink.warn(&format!("Error closing page: {}", e));
        }

        match self.browser.close().await {
            Ok(()) => {
                self.sink.info("Browser closed");
                Ok(())
            }
            Err(e) => {
                self.sink.error(&format!("Error closing browser: {}", e));
                Err(e)
            }
        }
    }
}

impl Drop for PageExtractor {
    fn drop(&mut self) {
        if self.state() != PipelineState::Closed {
            self.sink.warn("PageExtractor dropped without close()");
        }
    }
}

fn browser_options(config: &Config) -> BrowserOptions {
    BrowserOptions {
        headless: config.headless,
        window_width: config.viewport_width,
        window_height: config.viewport_height,
        args: config.browser_args.clone(),
        executable_path: config
            .chrome_path
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned()),
        cdp_endpoint: config.cdp_endpoint.clone(),
        launch_timeout_ms: config.launch_timeout_ms,
    }
}

fn page_options(config: &Config) -> PageOptions {
    PageOptions {
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
        navigation_timeout_ms: config.navigation_timeout_ms,
        ..Default::default()
    }
}
