//! # Session layer
//!
//! Browser, page and element handles on top of the CDP layer.
//!
//! ## Core concepts
//! - **BrowserContext**: a running (launched or connected) browser that owns pages
//! - **PageContext**: one tab; navigation, content, element queries
//! - **ElementRef**: a DOM element handle with text/HTML/attribute reads
//!
//! ## Modules
//! - `traits`: the handle traits and their option types
//! - `browser`: CDP-backed browser context
//! - `page`: CDP-backed page context
//! - `element`: CDP-backed element reference
//! - `mock`: in-memory implementations backed by `scraper`
//!
//! ## Example
//! ```rust,no_run
//! use page_crawler::session::{BrowserContext, BrowserContextImpl, BrowserOptions, NavigationOptions, PageOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let browser = BrowserContextImpl::launch(BrowserOptions::default()).await?;
//! let page = browser.create_page(PageOptions::default()).await?;
//!
//! let result = page.navigate("https://example.com", NavigationOptions::default()).await?;
//! println!("Page loaded: {}", result.url);
//!
//! browser.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod traits;
pub mod browser;
pub mod page;
pub mod element;
pub mod mock;

#[cfg(test)]
mod tests;

pub use traits::{
    BrowserContext, BrowserOptions, ElementRef, EvaluationResult, LoadState, NavigationOptions,
    NavigationResult, PageContext, PageOptions,
};

pub use browser::BrowserContextImpl;
pub use element::ElementRefImpl;
pub use page::PageContextImpl;

pub use mock::{MockBrowser, MockElement, MockPage};
