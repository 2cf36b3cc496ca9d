//! Diagnostics sink
//!
//! `PageExtractor` reports every step and every failure through a
//! `DiagnosticSink`. The default forwards to `tracing`; `MemorySink` keeps the
//! entries so tests can assert on them.

use std::sync::Mutex;

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// A recorded diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub level: DiagnosticLevel,
    pub message: String,
}

/// Destination for pipeline diagnostics
pub trait DiagnosticSink: Send + Sync + std::fmt::Debug {
    /// Record one message
    fn record(&self, level: DiagnosticLevel, message: &str);

    fn debug(&self, message: &str) {
        self.record(DiagnosticLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(DiagnosticLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(DiagnosticLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(DiagnosticLevel::Error, message);
    }
}

/// Forwards diagnostics to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&self, level: DiagnosticLevel, message: &str) {
        match level {
            DiagnosticLevel::Debug => tracing::debug!(target: "page_crawler::extractor", "{}", message),
            DiagnosticLevel::Info => tracing::info!(target: "page_crawler::extractor", "{}", message),
            DiagnosticLevel::Warn => tracing::warn!(target: "page_crawler::extractor", "{}", message),
            DiagnosticLevel::Error => tracing::error!(target: "page_crawler::extractor", "{}", message),
        }
    }
}

/// Keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<DiagnosticEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries, oldest first
    pub fn entries(&self) -> Vec<DiagnosticEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at `level`
    pub fn messages(&self, level: DiagnosticLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    /// Whether any entry at `level` contains `needle`
    pub fn contains(&self, level: DiagnosticLevel, needle: &str) -> bool {
        self.messages(level).iter().any(|m| m.contains(needle))
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl DiagnosticSink for MemorySink {
    fn record(&self, level: DiagnosticLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(DiagnosticEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.info("Browser initialized");
        sink.error("Error navigating to https://invalid.invalid");
        sink.info("Found 0 items");

        let entries = sink.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].level, DiagnosticLevel::Error);
        assert_eq!(
            sink.messages(DiagnosticLevel::Info),
            vec!["Browser initialized".to_string(), "Found 0 items".to_string()]
        );
        assert!(sink.contains(DiagnosticLevel::Error, "invalid.invalid"));
        assert!(!sink.contains(DiagnosticLevel::Warn, "invalid.invalid"));

        sink.clear();
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_tracing_sink_accepts_every_level() {
        let sink = TracingSink;
        sink.debug("debug");
        sink.info("info");
        sink.warn("warn");
        sink.error("error");
    }
}
