//! Session management traits
//!
//! This module defines the abstract interfaces for the browser, page and element
//! handles the extractor works against.

use async_trait::async_trait;
use std::sync::Arc;

pub use crate::cdp::traits::EvaluationResult;

/// Browser options for launching or connecting to a browser
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Headless mode (no GUI)
    pub headless: bool,
    /// Window width
    pub window_width: u32,
    /// Window height
    pub window_height: u32,
    /// Additional arguments to pass to Chrome
    pub args: Vec<String>,
    /// Chrome executable path
    pub executable_path: Option<String>,
    /// Existing CDP endpoint (e.g., "ws://localhost:9222"); a browser is launched when `None`
    pub cdp_endpoint: Option<String>,
    /// How long a launched browser may take to expose its endpoint
    pub launch_timeout_ms: u64,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1280,
            window_height: 800,
            args: vec![],
            executable_path: None,
            cdp_endpoint: None,
            launch_timeout_ms: 20_000,
        }
    }
}

/// Page options for creating a new page
#[derive(Debug, Clone)]
pub struct PageOptions {
    /// Default URL
    pub default_url: Option<String>,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Device scale factor
    pub device_scale_factor: f64,
    /// Mobile emulation
    pub is_mobile: bool,
    /// Default navigation timeout in milliseconds
    pub navigation_timeout_ms: u64,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            default_url: Some("about:blank".to_string()),
            viewport_width: 1280,
            viewport_height: 800,
            device_scale_factor: 1.0,
            is_mobile: false,
            navigation_timeout_ms: crate::config::DEFAULT_NAVIGATION_TIMEOUT_MS,
        }
    }
}

/// Navigation options
#[derive(Debug, Clone)]
pub struct NavigationOptions {
    /// Timeout in milliseconds
    pub timeout: u64,
    /// Wait until condition
    pub wait_until: LoadState,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            timeout: crate::config::DEFAULT_NAVIGATION_TIMEOUT_MS,
            wait_until: LoadState::NetworkIdle,
        }
    }
}

/// Page load state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Load,
    DOMContentLoaded,
    NetworkIdle,
    NetworkAlmostIdle,
}

impl LoadState {
    /// Name of the `Page.lifecycleEvent` that signals this state
    pub fn lifecycle_name(&self) -> &'static str {
        match self {
            LoadState::Load => "load",
            LoadState::DOMContentLoaded => "DOMContentLoaded",
            LoadState::NetworkIdle => "networkIdle",
            LoadState::NetworkAlmostIdle => "networkAlmostIdle",
        }
    }
}

/// Browser context trait
///
/// Represents a running browser instance.
#[async_trait]
pub trait BrowserContext: Send + Sync + std::fmt::Debug {
    /// Get browser ID
    fn id(&self) -> &str;

    /// Create a new page
    async fn create_page(&self, options: PageOptions) -> Result<Arc<dyn PageContext>, crate::Error>;

    /// Get all pages
    async fn get_pages(&self) -> Result<Vec<Arc<dyn PageContext>>, crate::Error>;

    /// Close the browser and every page in it
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if browser is active
    fn is_active(&self) -> bool;
}

/// Page context trait
///
/// Represents a page/tab in a browser.
#[async_trait]
pub trait PageContext: Send + Sync + std::fmt::Debug {
    /// Get page ID
    fn id(&self) -> &str;

    /// Get parent browser ID
    fn browser_id(&self) -> &str;

    /// Navigate to URL and wait for `options.wait_until`
    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<NavigationResult, crate::Error>;

    /// URL of the current document
    async fn url(&self) -> Result<String, crate::Error>;

    /// Get page content
    async fn get_content(&self) -> Result<String, crate::Error>;

    /// Set page content
    async fn set_content(&self, html: &str) -> Result<(), crate::Error>;

    /// Evaluate JavaScript
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, crate::Error>;

    /// Set viewport size
    async fn set_viewport(&self, width: u32, height: u32, device_scale_factor: f64) -> Result<(), crate::Error>;

    /// Timeout applied by `navigate` callers that have no opinion of their own
    fn default_navigation_timeout(&self) -> u64;

    /// Change the default navigation timeout
    fn set_default_navigation_timeout(&self, timeout_ms: u64);

    /// First element matching `selector`
    async fn query_selector(&self, selector: &str) -> Result<Option<Arc<dyn ElementRef>>, crate::Error>;

    /// All elements matching `selector`, in document order
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Arc<dyn ElementRef>>, crate::Error>;

    /// Close the page
    async fn close(&self) -> Result<(), crate::Error>;

    /// Check if page is active
    fn is_active(&self) -> bool;
}

/// Element reference trait
///
/// Represents a DOM element in a page.
#[async_trait]
pub trait ElementRef: Send + Sync + std::fmt::Debug {
    /// Get element ID
    fn id(&self) -> &str;

    /// Get parent page ID
    fn page_id(&self) -> &str;

    /// Element `textContent`, untrimmed
    async fn text_content(&self) -> Result<String, crate::Error>;

    /// Element `innerHTML`, untrimmed
    async fn inner_html(&self) -> Result<String, crate::Error>;

    /// Get element attribute; `None` when the attribute is absent
    async fn get_attribute(&self, name: &str) -> Result<Option<String>, crate::Error>;
}

/// Navigation result
#[derive(Debug, Clone)]
pub struct NavigationResult {
    /// Requested URL
    pub url: String,
    /// HTTP status of the main document, when one was observed
    pub status_code: Option<u16>,
    /// Whether the requested load state was reached
    pub is_loaded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_names() {
        assert_eq!(LoadState::NetworkIdle.lifecycle_name(), "networkIdle");
        assert_eq!(LoadState::Load.lifecycle_name(), "load");
        assert_eq!(LoadState::DOMContentLoaded.lifecycle_name(), "DOMContentLoaded");
    }

    #[test]
    fn test_defaults_match_crawler_settings() {
        let page = PageOptions::default();
        assert_eq!((page.viewport_width, page.viewport_height), (1280, 800));
        assert_eq!(page.navigation_timeout_ms, 60_000);

        let nav = NavigationOptions::default();
        assert_eq!(nav.wait_until, LoadState::NetworkIdle);
        assert_eq!(nav.timeout, 60_000);
    }
}
