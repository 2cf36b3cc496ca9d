//! Page-Crawler: minimal Chromium-driven page crawler
//!
//! Launches (or connects to) a browser over the Chrome DevTools Protocol,
//! extracts title/href pairs from matching elements and downloads images.

pub mod error;
pub mod config;

pub mod cdp;
pub mod session;
pub mod extractor;

// Re-exports
pub use error::{Error, Result};
pub use extractor::{ExtractedItem, PageExtractor};

/// Page-Crawler library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
