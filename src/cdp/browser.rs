//! CDP browser control implementation
//!
//! This module provides browser-level operations via the DevTools HTTP endpoint.

use super::client::CdpClientImpl;
use super::connection::CdpWebSocketConnection;
use super::traits::*;
use crate::Error;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// CDP browser implementation
#[derive(Debug)]
pub struct CdpBrowserImpl {
    /// Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    endpoint: String,
    /// HTTP client for the DevTools JSON endpoints
    http: reqwest::Client,
    /// Active connections (target_id -> connection)
    connections: Arc<tokio::sync::Mutex<HashMap<String, Arc<dyn CdpConnection>>>>,
}

impl CdpBrowserImpl {
    /// Create a new CDP browser controller
    ///
    /// # Arguments
    /// * `endpoint` - Browser WebSocket endpoint (e.g., "ws://localhost:9222")
    pub fn new<S: Into<String>>(endpoint: S) -> Self {
        let endpoint = endpoint.into();
        debug!("Creating CDP browser controller for endpoint: {}", endpoint);
        Self {
            endpoint,
            http: reqwest::Client::new(),
            connections: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
        }
    }

    /// Browser WebSocket endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// HTTP form of the endpoint, with any path stripped
    fn http_endpoint(&self) -> String {
        let http = self
            .endpoint
            .replacen("ws://", "http://", 1)
            .replacen("wss://", "https://", 1);

        match http.find("://") {
            Some(scheme_end) => {
                let authority_start = scheme_end + 3;
                match http[authority_start..].find('/') {
                    Some(path_start) => http[..authority_start + path_start].to_string(),
                    None => http,
                }
            }
            None => http,
        }
    }

    fn target_id_from_ws_url(ws_url: &str) -> String {
        ws_url.rsplit('/').next().unwrap_or("unknown").to_string()
    }
}

#[async_trait]
impl CdpBrowser for CdpBrowserImpl {
    /// Create a new CDP client for a page target
    async fn create_client(&self, target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        info!("Creating CDP client for target: {}", target_url);

        let connection = CdpWebSocketConnection::new(target_url).await?;

        self.connections.lock().await.insert(
            Self::target_id_from_ws_url(target_url),
            Arc::clone(&connection) as Arc<dyn CdpConnection>,
        );

        let client = Arc::new(CdpClientImpl::new(connection));

        // Page and Runtime are needed by every page operation
        client.enable_domain("Page").await?;
        client.enable_domain("Runtime").await?;

        Ok(client)
    }

    /// Close all connections
    async fn close(&self) -> Result<(), Error> {
        let mut connections = self.connections.lock().await;

        if connections.is_empty() {
            debug!("CdpBrowser::close: No active connections to close");
            return Ok(());
        }

        info!("CdpBrowser::close: Closing {} active CDP connections", connections.len());

        for (target_id, connection) in connections.drain() {
            if let Err(e) = connection.close().await {
                warn!("CdpBrowser::close: Failed to close connection to {}: {}", target_id, e);
            }
        }

        Ok(())
    }

    /// Get browser version
    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        let url = format!("{}/json/version", self.http_endpoint());
        debug!("Fetching browser version from {}", url);

        let version_json: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::browser_launch(format!("Failed to connect to browser at {}: {}", url, e)))?
            .json()
            .await?;

        let field = |name: &str| {
            version_json
                .get(name)
                .and_then(|v| v.as_str())
                .unwrap_or("unknown")
                .to_string()
        };

        Ok(BrowserVersion {
            protocol_version: field("Protocol-Version"),
            product: field("Browser"),
            user_agent: field("User-Agent"),
            js_version: field("V8-Version"),
        })
    }

    /// Create a new page target using the `/json/new` endpoint
    async fn create_target(&self, url: &str) -> Result<String, Error> {
        let new_url = format!("{}/json/new?{}", self.http_endpoint(), url);
        debug!("Creating new page via HTTP API: {}", new_url);

        let response = self.http.put(&new_url).send().await.map_err(|e| {
            Error::browser_launch(format!(
                "Failed to connect to Chrome CDP endpoint at {}: {}. \
                 Start Chrome with --remote-debugging-port=9222 or let the crawler launch it.",
                self.endpoint, e
            ))
        })?;

        let response_text = response.text().await?;

        let target_json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
            Error::cdp(format!(
                "Failed to parse new target response: {} (response was: {})",
                e, response_text
            ))
        })?;

        let ws_url = target_json
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::cdp("No webSocketDebuggerUrl in new target response"))?;

        debug!("Created new target with WebSocket URL: {}", ws_url);

        Ok(ws_url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_creation() {
        let browser = CdpBrowserImpl::new("ws://localhost:9222");
        assert_eq!(browser.endpoint(), "ws://localhost:9222");
    }

    #[test]
    fn test_http_endpoint_strips_browser_path() {
        let browser = CdpBrowserImpl::new("ws://127.0.0.1:40123/devtools/browser/abc-def");
        assert_eq!(browser.http_endpoint(), "http://127.0.0.1:40123");
    }

    #[test]
    fn test_http_endpoint_secure() {
        let browser = CdpBrowserImpl::new("wss://remote.example.com:9222");
        assert_eq!(browser.http_endpoint(), "https://remote.example.com:9222");
    }

    #[test]
    fn test_target_id_from_ws_url() {
        assert_eq!(
            CdpBrowserImpl::target_id_from_ws_url("ws://localhost:9222/devtools/page/ABC123"),
            "ABC123"
        );
    }
}
