//! Mock session implementation for testing
//!
//! Pages are backed by an in-memory document parsed with `scraper`. Navigation
//! resolves URLs against a route table shared by every page of a browser.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::traits::{
    BrowserContext, BrowserOptions, ElementRef, EvaluationResult, NavigationOptions,
    NavigationResult, PageContext, PageOptions,
};
use crate::Error;

type Routes = Arc<std::sync::RwLock<HashMap<String, String>>>;

/// Mock browser context
#[derive(Debug)]
pub struct MockBrowser {
    id: String,
    options: BrowserOptions,
    routes: Routes,
    fail_queries: bool,
    fail_reads: bool,
    pages: Arc<RwLock<Vec<Arc<MockPage>>>>,
    is_active: Arc<RwLock<bool>>,
}

impl MockBrowser {
    /// Create a new mock browser
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            options,
            routes: Arc::new(std::sync::RwLock::new(HashMap::new())),
            fail_queries: false,
            fail_reads: false,
            pages: Arc::new(RwLock::new(Vec::new())),
            is_active: Arc::new(RwLock::new(true)),
        }
    }

    /// Serve `html` when a page navigates to `url`
    pub fn with_route<U: Into<String>, H: Into<String>>(self, url: U, html: H) -> Self {
        if let Ok(mut routes) = self.routes.write() {
            routes.insert(url.into(), html.into());
        }
        self
    }

    /// Every element query on pages of this browser fails
    pub fn with_failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    /// Every element read on pages of this browser fails as a stale handle
    pub fn with_failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Get browser options
    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    /// Get page count
    pub async fn page_count(&self) -> usize {
        self.pages.read().await.len()
    }
}

#[async_trait]
impl BrowserContext for MockBrowser {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, Error> {
        if !self.is_active() {
            return Err(Error::session_closed(format!("browser {}", self.id)));
        }

        let page = Arc::new(MockPage::with_routes(
            self.id.clone(),
            options,
            Arc::clone(&self.routes),
        ));
        page.fail_queries.store(self.fail_queries, Ordering::Relaxed);
        page.fail_reads.store(self.fail_reads, Ordering::Relaxed);
        self.pages.write().await.push(Arc::clone(&page));
        Ok(page)
    }

    async fn get_pages(&self) -> Result<Vec<Arc<dyn PageContext>>, Error> {
        let pages = self.pages.read().await;
        Ok(pages.iter().map(|p| p.clone() as Arc<dyn PageContext>).collect())
    }

    async fn close(&self) -> Result<(), Error> {
        for page in self.pages.write().await.drain(..) {
            page.close().await?;
        }
        *self.is_active.write().await = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        // try_read keeps this usable from sync code
        self.is_active
            .try_read()
            .ok()
            .map(|active| *active)
            .unwrap_or(false)
    }
}

/// Mock page context
#[derive(Debug)]
pub struct MockPage {
    id: String,
    browser_id: String,
    options: PageOptions,
    routes: Routes,
    url: Arc<RwLock<String>>,
    content: Arc<RwLock<String>>,
    viewport: Arc<RwLock<(u32, u32, f64)>>,
    navigation_timeout_ms: AtomicU64,
    fail_queries: AtomicBool,
    fail_reads: AtomicBool,
    is_active: Arc<RwLock<bool>>,
}

impl MockPage {
    /// Create a new mock page with no routes
    pub fn new(browser_id: String, options: PageOptions) -> Self {
        Self::with_routes(browser_id, options, Arc::new(std::sync::RwLock::new(HashMap::new())))
    }

    fn with_routes(browser_id: String, options: PageOptions, routes: Routes) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            browser_id,
            navigation_timeout_ms: AtomicU64::new(options.navigation_timeout_ms),
            viewport: Arc::new(RwLock::new((
                options.viewport_width,
                options.viewport_height,
                options.device_scale_factor,
            ))),
            options,
            routes,
            url: Arc::new(RwLock::new("about:blank".to_string())),
            content: Arc::new(RwLock::new(String::new())),
            fail_queries: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            is_active: Arc::new(RwLock::new(true)),
        }
    }

    /// Current viewport `(width, height, scale)`
    pub async fn viewport(&self) -> (u32, u32, f64) {
        *self.viewport.read().await
    }

    /// Options the page was created with
    pub fn options(&self) -> &PageOptions {
        &self.options
    }

    async fn ensure_active(&self) -> Result<(), Error> {
        if !*self.is_active.read().await {
            return Err(Error::session_closed(format!("page {}", self.id)));
        }
        Ok(())
    }

    async fn select(&self, selector: &str) -> Result<Vec<ElementSnapshot>, Error> {
        self.ensure_active().await?;

        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(Error::script_execution_failed(format!(
                "Execution context was destroyed while querying '{}'",
                selector
            )));
        }

        let html = self.content.read().await.clone();
        select_snapshots(&html, selector)
    }

    fn element(&self, snapshot: ElementSnapshot) -> Arc<dyn ElementRef> {
        let element = MockElement::new(self.id.clone(), snapshot);
        if self.fail_reads.load(Ordering::Relaxed) {
            Arc::new(element.failing())
        } else {
            Arc::new(element)
        }
    }
}

/// What the mock keeps of a matched element
#[derive(Debug, Clone, Default)]
pub struct ElementSnapshot {
    /// `textContent`
    pub text: String,
    /// `innerHTML`
    pub inner_html: String,
    /// Attributes by name
    pub attributes: HashMap<String, String>,
}

/// Parse `html` and snapshot every element matching `selector`, in document order.
/// `scraper::Html` is not `Send`, so it never lives across an await.
fn select_snapshots(html: &str, selector: &str) -> Result<Vec<ElementSnapshot>, Error> {
    let parsed = scraper::Selector::parse(selector)
        .map_err(|e| Error::invalid_selector(format!("'{}': {}", selector, e)))?;
    let document = scraper::Html::parse_document(html);

    Ok(document
        .select(&parsed)
        .map(|element| ElementSnapshot {
            text: element.text().collect(),
            inner_html: element.inner_html(),
            attributes: element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        })
        .collect())
}

#[async_trait]
impl PageContext for MockPage {
    fn id(&self) -> &str {
        &self.id
    }

    fn browser_id(&self) -> &str {
        &self.browser_id
    }

    async fn navigate(&self, url: &str, _options: NavigationOptions) -> Result<NavigationResult, Error> {
        self.ensure_active().await?;

        let html = self
            .routes
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .get(url)
            .cloned()
            .ok_or_else(|| Error::navigation_failed(format!("net::ERR_NAME_NOT_RESOLVED at {}", url)))?;

        *self.content.write().await = html;
        *self.url.write().await = url.to_string();

        Ok(NavigationResult {
            url: url.to_string(),
            status_code: Some(200),
            is_loaded: true,
        })
    }

    async fn url(&self) -> Result<String, Error> {
        self.ensure_active().await?;
        Ok(self.url.read().await.clone())
    }

    async fn get_content(&self) -> Result<String, Error> {
        self.ensure_active().await?;
        Ok(self.content.read().await.clone())
    }

    async fn set_content(&self, html: &str) -> Result<(), Error> {
        self.ensure_active().await?;
        *self.content.write().await = html.to_string();
        Ok(())
    }

    async fn evaluate(&self, script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        self.ensure_active().await?;

        if script.contains("location.href") {
            Ok(EvaluationResult::String(self.url.read().await.clone()))
        } else if script.contains("document.documentElement.outerHTML") {
            Ok(EvaluationResult::String(self.content.read().await.clone()))
        } else {
            Ok(EvaluationResult::String("mock result".to_string()))
        }
    }

    async fn set_viewport(&self, width: u32, height: u32, device_scale_factor: f64) -> Result<(), Error> {
        self.ensure_active().await?;
        *self.viewport.write().await = (width, height, device_scale_factor);
        Ok(())
    }

    fn default_navigation_timeout(&self) -> u64 {
        self.navigation_timeout_ms.load(Ordering::Relaxed)
    }

    fn set_default_navigation_timeout(&self, timeout_ms: u64) {
        self.navigation_timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<Arc<dyn ElementRef>>, Error> {
        let first = self.select(selector).await?.into_iter().next();
        Ok(first.map(|snapshot| self.element(snapshot)))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        let snapshots = self.select(selector).await?;
        Ok(snapshots.into_iter().map(|s| self.element(s)).collect())
    }

    async fn close(&self) -> Result<(), Error> {
        *self.is_active.write().await = false;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active
            .try_read()
            .ok()
            .map(|active| *active)
            .unwrap_or(false)
    }
}

/// Mock element reference
#[derive(Debug)]
pub struct MockElement {
    id: String,
    page_id: String,
    snapshot: ElementSnapshot,
    fail_reads: bool,
}

impl MockElement {
    /// Create a new mock element
    pub fn new(page_id: String, snapshot: ElementSnapshot) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_id,
            snapshot,
            fail_reads: false,
        }
    }

    /// Every read fails as if the node had been detached
    pub fn failing(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    fn ensure_readable(&self) -> Result<(), Error> {
        if self.fail_reads {
            return Err(Error::element_not_found(format!("element {} is detached", self.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl ElementRef for MockElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    async fn text_content(&self) -> Result<String, Error> {
        self.ensure_readable()?;
        Ok(self.snapshot.text.clone())
    }

    async fn inner_html(&self) -> Result<String, Error> {
        self.ensure_readable()?;
        Ok(self.snapshot.inner_html.clone())
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, Error> {
        self.ensure_readable()?;
        Ok(self.snapshot.attributes.get(name).cloned())
    }
}
