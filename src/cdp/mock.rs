//! Mock CDP implementation for testing
//!
//! The mock connection answers every command with a canned result and lets
//! callers push events to subscribers. The mock client drives a navigation
//! through the same lifecycle events a real page emits.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{mpsc, Mutex};

use crate::cdp::traits::*;
use crate::cdp::types::{PropertyDescriptor, RemoteObject};
use crate::Error;

/// Lifecycle events emitted, in order, for every mock navigation
const LIFECYCLE_SEQUENCE: &[&str] = &["DOMContentLoaded", "load", "networkAlmostIdle", "networkIdle"];

/// Mock CDP connection
#[derive(Debug)]
pub struct MockCdpConnection {
    is_active: Arc<AtomicBool>,
    next_id: AtomicU64,
    subscribers: StdMutex<Vec<mpsc::Sender<CdpEvent>>>,
    commands: StdMutex<Vec<String>>,
}

impl MockCdpConnection {
    /// Create a new mock CDP connection
    pub fn new() -> Self {
        Self {
            is_active: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
            subscribers: StdMutex::new(Vec::new()),
            commands: StdMutex::new(Vec::new()),
        }
    }

    /// Deliver an event to every live subscriber
    pub fn emit(&self, method: &str, params: serde_json::Value) {
        let event = CdpEvent {
            method: method.to_string(),
            params,
            session_id: None,
        };

        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.try_send(event.clone()).is_ok());
        }
    }

    /// Methods sent through this connection, oldest first
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockCdpConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpConnection for MockCdpConnection {
    async fn send_command(&self, method: &str, _params: serde_json::Value) -> Result<CdpResponse, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(method.to_string());
        }

        let result = match method {
            "Page.navigate" => serde_json::json!({
                "frameId": "mock-frame",
                "loaderId": uuid::Uuid::new_v4().to_string(),
            }),
            "Runtime.evaluate" => serde_json::json!({
                "result": { "type": "string", "value": "mock result" }
            }),
            "Page.getFrameTree" => serde_json::json!({
                "frameTree": { "frame": { "id": "mock-frame", "url": "about:blank" } }
            }),
            _ => serde_json::json!({}),
        };

        Ok(CdpResponse {
            id,
            result: Some(result),
            error: None,
        })
    }

    async fn listen_events(&self) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::websocket("Connection is not active"));
        }

        let (tx, rx) = mpsc::channel(100);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        Ok(rx)
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.clear();
        }
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::Relaxed)
    }
}

/// Mock CDP client
///
/// Holds the current URL and document as plain strings. Element handles are
/// not modelled: `querySelectorAll` style lookups see an empty array.
#[derive(Debug)]
pub struct MockCdpClient {
    connection: Arc<MockCdpConnection>,
    url: Arc<Mutex<Option<String>>>,
    content: Arc<Mutex<String>>,
    fail_navigation: Option<String>,
    stall_load: bool,
    document_status: u16,
    released_objects: bool,
}

impl MockCdpClient {
    /// Create a new mock CDP client
    pub fn new() -> Self {
        Self {
            connection: Arc::new(MockCdpConnection::new()),
            url: Arc::new(Mutex::new(None)),
            content: Arc::new(Mutex::new(String::new())),
            fail_navigation: None,
            stall_load: false,
            document_status: 200,
            released_objects: false,
        }
    }

    /// Every navigation fails with the given browser error text
    pub fn with_navigation_error<S: Into<String>>(mut self, error_text: S) -> Self {
        self.fail_navigation = Some(error_text.into());
        self
    }

    /// Navigations start but never emit lifecycle events
    pub fn with_stalled_load(mut self) -> Self {
        self.stall_load = true;
        self
    }

    /// Every `callFunctionOn` fails as if the object had been released
    pub fn with_released_objects(mut self) -> Self {
        self.released_objects = true;
        self
    }

    /// HTTP status reported for navigated documents
    pub fn with_document_status(mut self, status: u16) -> Self {
        self.document_status = status;
        self
    }

    /// Underlying mock connection
    pub fn mock_connection(&self) -> Arc<MockCdpConnection> {
        Arc::clone(&self.connection)
    }
}

impl Default for MockCdpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpClient for MockCdpClient {
    fn connection(&self) -> Arc<dyn CdpConnection> {
        self.connection.clone()
    }

    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        self.connection.send_command("Page.navigate", serde_json::json!({ "url": url })).await?;

        if let Some(error_text) = &self.fail_navigation {
            return Ok(NavigationResult {
                frame_id: "mock-frame".to_string(),
                loader_id: None,
                url: url.to_string(),
                error_text: Some(error_text.clone()),
            });
        }

        let loader_id = uuid::Uuid::new_v4().to_string();
        *self.url.lock().await = Some(url.to_string());

        if self.stall_load {
            return Ok(NavigationResult {
                frame_id: "mock-frame".to_string(),
                loader_id: Some(loader_id),
                url: url.to_string(),
                error_text: None,
            });
        }

        self.connection.emit(
            "Network.responseReceived",
            serde_json::json!({
                "loaderId": loader_id,
                "type": "Document",
                "response": { "url": url, "status": self.document_status },
            }),
        );
        for name in LIFECYCLE_SEQUENCE {
            self.connection.emit(
                "Page.lifecycleEvent",
                serde_json::json!({
                    "frameId": "mock-frame",
                    "loaderId": loader_id,
                    "name": name,
                }),
            );
        }

        Ok(NavigationResult {
            frame_id: "mock-frame".to_string(),
            loader_id: Some(loader_id),
            url: url.to_string(),
            error_text: None,
        })
    }

    async fn evaluate(&self, script: &str, _await_promise: bool) -> Result<EvaluationResult, Error> {
        if script.contains("location.href") {
            let url = self.url.lock().await.clone().unwrap_or_else(|| "about:blank".to_string());
            Ok(EvaluationResult::String(url))
        } else if script.contains("document.documentElement.outerHTML") {
            Ok(EvaluationResult::String(self.content.lock().await.clone()))
        } else if script.contains("throw") {
            Err(Error::script_execution_failed(format!("Uncaught: {}", script)))
        } else {
            Ok(EvaluationResult::String("mock result".to_string()))
        }
    }

    async fn evaluate_handle(&self, _script: &str) -> Result<RemoteObject, Error> {
        Ok(RemoteObject {
            r#type: "object".to_string(),
            subtype: Some("array".to_string()),
            class_name: Some("Array".to_string()),
            object_id: Some(format!("mock-object-{}", uuid::Uuid::new_v4())),
            ..Default::default()
        })
    }

    async fn call_function_on(
        &self,
        object_id: &str,
        _function_declaration: &str,
        _arguments: Vec<serde_json::Value>,
    ) -> Result<EvaluationResult, Error> {
        if self.released_objects {
            return Err(Error::cdp(format!(
                "CDP error -32000: Could not find object with given id ({})",
                object_id
            )));
        }
        Ok(EvaluationResult::Null)
    }

    async fn get_properties(&self, _object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
        Ok(vec![])
    }

    async fn release_object(&self, _object_id: &str) -> Result<(), Error> {
        Ok(())
    }

    async fn get_content(&self) -> Result<String, Error> {
        Ok(self.content.lock().await.clone())
    }

    async fn set_content(&self, html: &str) -> Result<(), Error> {
        *self.content.lock().await = html.to_string();
        Ok(())
    }

    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        self.call_method(&format!("{}.enable", domain), serde_json::json!({})).await?;
        Ok(())
    }

    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;
        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }

    async fn subscribe_events(&self, event_type: &str) -> Result<mpsc::Receiver<CdpEvent>, Error> {
        let mut events = self.connection.listen_events().await?;
        if event_type == "*" {
            return Ok(events);
        }

        let (tx, rx) = mpsc::channel(100);
        let filter = event_type.to_string();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if event.method == filter && tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}

/// Mock CDP browser
#[derive(Debug)]
pub struct MockCdpBrowser {
    is_active: AtomicBool,
}

impl MockCdpBrowser {
    /// Create a new mock CDP browser
    pub fn new() -> Self {
        Self {
            is_active: AtomicBool::new(true),
        }
    }
}

impl Default for MockCdpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CdpBrowser for MockCdpBrowser {
    async fn create_client(&self, _target_url: &str) -> Result<Arc<dyn CdpClient>, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::session_closed("Browser is closed"));
        }

        Ok(Arc::new(MockCdpClient::new()))
    }

    async fn close(&self) -> Result<(), Error> {
        self.is_active.store(false, Ordering::Relaxed);
        Ok(())
    }

    async fn get_version(&self) -> Result<BrowserVersion, Error> {
        Ok(BrowserVersion {
            protocol_version: "1.3".to_string(),
            product: "Chrome/120.0.0.0".to_string(),
            user_agent: "Mock Chrome/120.0.0.0".to_string(),
            js_version: "12.0.0.0".to_string(),
        })
    }

    async fn create_target(&self, url: &str) -> Result<String, Error> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(Error::session_closed("Browser is closed"));
        }

        let target_id = uuid::Uuid::new_v4().to_string();
        let ws_url = format!("ws://localhost:9222/devtools/page/{}", target_id);
        tracing::debug!("Mock: Created target {} for {} => {}", target_id, url, ws_url);
        Ok(ws_url)
    }
}
