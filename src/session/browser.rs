//! Browser context implementation
//!
//! Manages browser lifecycle and page creation.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::cdp::browser::CdpBrowserImpl;
use crate::cdp::launcher::{ChromeProcess, LaunchOptions};
use crate::cdp::traits::CdpBrowser;
use crate::session::traits::{BrowserContext, BrowserOptions, PageContext, PageOptions};
use crate::Error;

/// Browser context implementation
#[derive(Debug)]
pub struct BrowserContextImpl {
    id: String,
    options: BrowserOptions,
    cdp_browser: Arc<dyn CdpBrowser>,
    process: tokio::sync::Mutex<Option<ChromeProcess>>,
    pages: Arc<RwLock<HashMap<String, Arc<dyn PageContext>>>>,
    is_active: Arc<RwLock<bool>>,
}

impl BrowserContextImpl {
    /// Create a new browser context over an existing CDP browser
    pub fn new(options: BrowserOptions, cdp_browser: Arc<dyn CdpBrowser>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            options,
            cdp_browser,
            process: tokio::sync::Mutex::new(None),
            pages: Arc::new(RwLock::new(HashMap::new())),
            is_active: Arc::new(RwLock::new(true)),
        }
    }

    /// Connect to `options.cdp_endpoint`, or launch a local browser when it is unset
    pub async fn launch(options: BrowserOptions) -> Result<Self, Error> {
        if let Some(endpoint) = options.cdp_endpoint.clone() {
            tracing::info!("Connecting to existing browser at {}", endpoint);
            let cdp_browser = Arc::new(CdpBrowserImpl::new(endpoint));
            let version = cdp_browser.get_version().await?;
            tracing::info!("Connected to {}", version.product);
            return Ok(Self::new(options, cdp_browser));
        }

        let launch_options = LaunchOptions {
            executable: options.executable_path.clone().map(Into::into),
            headless: options.headless,
            args: options.args.clone(),
            window_size: (options.window_width, options.window_height),
            startup_timeout: Duration::from_millis(options.launch_timeout_ms),
        };

        let process = ChromeProcess::launch(&launch_options).await?;
        let cdp_browser = Arc::new(CdpBrowserImpl::new(process.endpoint()));

        let browser = Self::new(options, cdp_browser);
        *browser.process.lock().await = Some(process);
        Ok(browser)
    }

    /// Get browser options
    pub fn options(&self) -> &BrowserOptions {
        &self.options
    }

    fn ensure_active(&self) -> Result<(), Error> {
        let active = *self
            .is_active
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;
        if !active {
            return Err(Error::session_closed(format!("browser {}", self.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserContext for BrowserContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, Error> {
        self.ensure_active()?;

        let default_url = options.default_url.as_deref().unwrap_or("about:blank");

        let ws_url = self.cdp_browser.create_target(default_url).await?;
        let cdp_client = self.cdp_browser.create_client(&ws_url).await?;

        let target_id = ws_url.rsplit('/').next().unwrap_or("unknown").to_string();

        let page = crate::session::page::PageContextImpl::new(self.id.clone(), options, cdp_client);
        page.prepare().await?;
        let page: Arc<dyn PageContext> = Arc::new(page);

        self.pages
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .insert(target_id, Arc::clone(&page));

        Ok(page)
    }

    async fn get_pages(&self) -> Result<Vec<Arc<dyn PageContext>>, Error> {
        self.ensure_active()?;

        let pages = self
            .pages
            .read()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?;
        Ok(pages.values().cloned().collect())
    }

    async fn close(&self) -> Result<(), Error> {
        // Collect first so no lock is held across an await
        let pages_to_close: Vec<Arc<dyn PageContext>> = self
            .pages
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))?
            .drain()
            .map(|(_, page)| page)
            .collect();

        for page in pages_to_close {
            if let Err(e) = page.close().await {
                tracing::warn!("BrowserContext::close: failed to close page {}: {}", page.id(), e);
            }
        }

        *self
            .is_active
            .write()
            .map_err(|e| Error::internal(format!("Lock error: {}", e)))? = false;

        if let Err(e) = self.cdp_browser.close().await {
            tracing::warn!("BrowserContext::close: failed to close CDP connections: {}", e);
        }

        if let Some(process) = self.process.lock().await.take() {
            tracing::info!("Shutting down browser process");
            process.shutdown().await?;
        }

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active
            .read()
            .map(|active| *active)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_browser() -> BrowserContextImpl {
        let cdp_browser = Arc::new(crate::cdp::mock::MockCdpBrowser::new());
        BrowserContextImpl::new(BrowserOptions::default(), cdp_browser)
    }

    #[tokio::test]
    async fn test_browser_creation() {
        let browser = mock_browser();

        assert!(browser.is_active());
        assert!(!browser.id().is_empty());
        assert!(browser.options().headless);
    }

    #[tokio::test]
    async fn test_browser_create_page() {
        let browser = mock_browser();

        let page = browser.create_page(PageOptions::default()).await.unwrap();

        assert_eq!(page.browser_id(), browser.id());
        assert!(page.is_active());
    }

    #[tokio::test]
    async fn test_browser_get_pages() {
        let browser = mock_browser();

        browser.create_page(PageOptions::default()).await.unwrap();
        browser.create_page(PageOptions::default()).await.unwrap();

        let pages = browser.get_pages().await.unwrap();
        assert_eq!(pages.len(), 2);
    }

    #[tokio::test]
    async fn test_browser_close() {
        let browser = mock_browser();

        let page = browser.create_page(PageOptions::default()).await.unwrap();

        browser.close().await.unwrap();
        assert!(!browser.is_active());
        assert!(!page.is_active());

        let result = browser.create_page(PageOptions::default()).await;
        assert!(matches!(result, Err(Error::SessionClosed(_))));
    }

    #[tokio::test]
    async fn test_launch_with_unreachable_endpoint() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let options = BrowserOptions {
            cdp_endpoint: Some(format!("ws://{}", addr)),
            ..Default::default()
        };
        let result = BrowserContextImpl::launch(options).await;
        assert!(matches!(result, Err(Error::BrowserLaunch(_))));
    }
}
