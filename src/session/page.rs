//! Page context implementation
//!
//! Manages page lifecycle and operations.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::cdp::traits::CdpClient;
use crate::cdp::types::{LifecycleEventParams, RemoteObject, ResponseReceivedParams};
use crate::session::element::ElementRefImpl;
use crate::session::traits::{
    ElementRef, EvaluationResult, NavigationOptions, NavigationResult, PageContext, PageOptions,
};
use crate::Error;

/// Page context implementation
#[derive(Debug)]
pub struct PageContextImpl {
    id: String,
    browser_id: String,
    options: PageOptions,
    cdp_client: Arc<dyn CdpClient>,
    navigation_timeout_ms: AtomicU64,
    is_active: Arc<tokio::sync::RwLock<bool>>,
}

impl PageContextImpl {
    /// Create a new page context
    pub fn new(browser_id: String, options: PageOptions, cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            browser_id,
            navigation_timeout_ms: AtomicU64::new(options.navigation_timeout_ms),
            options,
            cdp_client,
            is_active: Arc::new(tokio::sync::RwLock::new(true)),
        }
    }

    /// Enable the domains navigation relies on and apply the viewport
    pub async fn prepare(&self) -> Result<(), Error> {
        self.cdp_client.enable_domain("Network").await?;
        self.cdp_client
            .call_method(
                "Page.setLifecycleEventsEnabled",
                serde_json::json!({ "enabled": true }),
            )
            .await?;

        self.set_viewport(
            self.options.viewport_width,
            self.options.viewport_height,
            self.options.device_scale_factor,
        )
        .await
    }

    async fn ensure_active(&self) -> Result<(), Error> {
        if !*self.is_active.read().await {
            return Err(Error::session_closed(format!("page {}", self.id)));
        }
        Ok(())
    }

    /// Evaluate `script` and keep the result as a handle, mapping selector syntax errors
    async fn evaluate_selector(&self, selector: &str, script: String) -> Result<RemoteObject, Error> {
        match self.cdp_client.evaluate_handle(&script).await {
            Err(Error::ScriptExecutionFailed(msg)) if msg.contains("is not a valid selector") => {
                Err(Error::invalid_selector(format!("'{}': {}", selector, msg)))
            }
            other => other,
        }
    }

    /// Start a navigation and wait for `wait_for` on its loader; yields the document status
    async fn run_navigation(
        &self,
        url: &str,
        wait_for: &str,
        events: &mut tokio::sync::mpsc::Receiver<crate::cdp::traits::CdpEvent>,
    ) -> Result<Option<u16>, Error> {
        let started = self.cdp_client.navigate(url).await?;

        if let Some(error_text) = started.error_text {
            return Err(Error::navigation_failed(format!("{} at {}", error_text, url)));
        }

        let Some(loader_id) = started.loader_id else {
            tracing::debug!("Same-document navigation to {}", url);
            return Ok(None);
        };

        let mut status_code = None;
        while let Some(event) = events.recv().await {
            match event.method.as_str() {
                "Network.responseReceived" => {
                    let Ok(params) = serde_json::from_value::<ResponseReceivedParams>(event.params) else {
                        continue;
                    };
                    if params.r#type.as_deref() == Some("Document")
                        && params.loader_id.as_deref() == Some(loader_id.as_str())
                    {
                        status_code = Some(params.response.status as u16);
                    }
                }
                "Page.lifecycleEvent" => {
                    let Ok(params) = serde_json::from_value::<LifecycleEventParams>(event.params) else {
                        continue;
                    };
                    if params.loader_id == loader_id && params.name == wait_for {
                        return Ok(status_code);
                    }
                }
                _ => {}
            }
        }

        Err(Error::websocket(format!(
            "Event stream ended before {} fired for {}",
            wait_for, url
        )))
    }

    fn element(&self, object_id: String) -> Arc<dyn ElementRef> {
        Arc::new(ElementRefImpl::new(
            self.id.clone(),
            object_id,
            Arc::clone(&self.cdp_client),
        ))
    }
}

#[async_trait]
impl PageContext for PageContextImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn browser_id(&self) -> &str {
        &self.browser_id
    }

    async fn navigate(&self, url: &str, options: NavigationOptions) -> Result<NavigationResult, Error> {
        self.ensure_active().await?;

        // Subscribe before navigating so no lifecycle event is missed
        let mut events = self.cdp_client.subscribe_events("*").await?;
        let wait_for = options.wait_until.lifecycle_name();

        let navigation = self.run_navigation(url, wait_for, &mut events);

        match tokio::time::timeout(Duration::from_millis(options.timeout), navigation).await {
            Ok(Ok(status_code)) => {
                tracing::debug!("PageContext::navigate: {} reached {} (status {:?})", url, wait_for, status_code);
                Ok(NavigationResult {
                    url: url.to_string(),
                    status_code,
                    is_loaded: true,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::timeout(format!(
                "Navigation to {} did not reach {} within {} ms",
                url, wait_for, options.timeout
            ))),
        }
    }

    async fn url(&self) -> Result<String, Error> {
        self.ensure_active().await?;

        match self.cdp_client.evaluate("window.location.href", false).await? {
            EvaluationResult::String(url) => Ok(url),
            other => Err(Error::cdp(format!("Unexpected location value: {:?}", other))),
        }
    }

    async fn get_content(&self) -> Result<String, Error> {
        self.ensure_active().await?;
        self.cdp_client.get_content().await
    }

    async fn set_content(&self, html: &str) -> Result<(), Error> {
        self.ensure_active().await?;
        self.cdp_client.set_content(html).await
    }

    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        self.ensure_active().await?;

        let result = self.cdp_client.evaluate(script, await_promise).await?;
        tracing::debug!("PageContext::evaluate: CDP returned {:?}", result);
        Ok(result)
    }

    async fn set_viewport(&self, width: u32, height: u32, device_scale_factor: f64) -> Result<(), Error> {
        self.ensure_active().await?;

        self.cdp_client
            .call_method(
                "Emulation.setDeviceMetricsOverride",
                serde_json::json!({
                    "width": width,
                    "height": height,
                    "deviceScaleFactor": device_scale_factor,
                    "mobile": self.options.is_mobile,
                }),
            )
            .await?;

        Ok(())
    }

    fn default_navigation_timeout(&self) -> u64 {
        self.navigation_timeout_ms.load(Ordering::Relaxed)
    }

    fn set_default_navigation_timeout(&self, timeout_ms: u64) {
        self.navigation_timeout_ms.store(timeout_ms, Ordering::Relaxed);
    }

    async fn query_selector(&self, selector: &str) -> Result<Option<Arc<dyn ElementRef>>, Error> {
        self.ensure_active().await?;

        let script = format!("document.querySelector({})", serde_json::to_string(selector)?);
        let handle = self.evaluate_selector(selector, script).await?;

        if handle.subtype.as_deref() == Some("null") {
            return Ok(None);
        }

        Ok(handle.object_id.map(|object_id| self.element(object_id)))
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Arc<dyn ElementRef>>, Error> {
        self.ensure_active().await?;

        let script = format!(
            "Array.from(document.querySelectorAll({}))",
            serde_json::to_string(selector)?
        );
        let handle = self.evaluate_selector(selector, script).await?;
        let array_id = handle
            .object_id
            .ok_or_else(|| Error::cdp(format!("No handle returned for selector '{}'", selector)))?;

        let properties = self.cdp_client.get_properties(&array_id).await;

        if let Err(e) = self.cdp_client.release_object(&array_id).await {
            tracing::debug!("Failed to release element array {}: {}", array_id, e);
        }

        let mut indexed: Vec<(usize, String)> = properties?
            .into_iter()
            .filter_map(|property| {
                let index = property.name.parse::<usize>().ok()?;
                let object_id = property.value?.object_id?;
                Some((index, object_id))
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);

        tracing::debug!("Selector '{}' matched {} elements", selector, indexed.len());

        Ok(indexed
            .into_iter()
            .map(|(_, object_id)| self.element(object_id))
            .collect())
    }

    async fn close(&self) -> Result<(), Error> {
        if !*self.is_active.read().await {
            tracing::debug!("PageContext::close: Page {} is already inactive", self.id);
            return Ok(());
        }

        tracing::info!("PageContext::close: Closing page {}", self.id);

        if let Err(e) = self
            .cdp_client
            .call_method("Page.close", serde_json::json!({}))
            .await
        {
            tracing::warn!("PageContext::close: Page.close failed for page {}: {}", self.id, e);
        }

        // Inactive regardless of the CDP result
        *self.is_active.write().await = false;

        if let Err(e) = self.cdp_client.connection().close().await {
            tracing::debug!("PageContext::close: connection close failed: {}", e);
        }

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
