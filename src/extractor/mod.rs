//! # Page extraction pipeline
//!
//! `PageExtractor` owns one browser and one page and runs the crawl:
//! initialize, navigate, extract items and download images, close.
//!
//! ## Example
//! ```rust,no_run
//! use page_crawler::config::Config;
//! use page_crawler::extractor::{PageExtractor, TracingSink};
//! use std::sync::Arc;
//!
//! # async fn example() -> page_crawler::Result<()> {
//! let extractor = PageExtractor::initialize(Config::default(), Arc::new(TracingSink)).await?;
//! extractor.navigate_to_base().await?;
//! let items = extractor.extract_items(".crayons-story__title a").await?;
//! println!("{} items", items.len());
//! extractor.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod download;
pub mod service;
pub mod sink;
pub mod types;

#[cfg(test)]
mod tests;

pub use download::ImageDownloader;
pub use service::PageExtractor;
pub use sink::{DiagnosticEntry, DiagnosticLevel, DiagnosticSink, MemorySink, TracingSink};
pub use types::{ExtractedItem, PipelineState};
