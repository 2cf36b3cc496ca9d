//! Extraction data types

use serde::{Deserialize, Serialize};

/// One matched element: its trimmed text and raw `href`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedItem {
    /// Trimmed `textContent`; may be empty
    pub title: String,
    /// `href` attribute exactly as written, `None` when absent
    pub href: Option<String>,
}

impl ExtractedItem {
    pub fn new<T: Into<String>>(title: T, href: Option<String>) -> Self {
        Self {
            title: title.into(),
            href,
        }
    }
}

/// Where a `PageExtractor` is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Browser and page acquired, nothing loaded yet
    Initialized,
    /// A document has been loaded by navigation or `set_content`
    Navigated,
    /// Browser released; every further operation fails
    Closed,
}
