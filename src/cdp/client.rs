//! CDP client implementation
//!
//! This module provides a high-level CDP client with typed methods for common operations.

use super::traits::*;
use super::types::*;
use crate::Error;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// CDP client implementation
#[derive(Debug, Clone)]
pub struct CdpClientImpl {
    /// Underlying CDP connection
    connection: Arc<dyn CdpConnection>,
}

impl CdpClientImpl {
    /// Create a new CDP client
    ///
    /// # Arguments
    /// * `connection` - CDP connection instance
    pub fn new(connection: Arc<dyn CdpConnection>) -> Self {
        Self { connection }
    }

    /// Parse remote object value to evaluation result
    pub(crate) fn parse_remote_object(obj: &RemoteObject) -> EvaluationResult {
        match obj.r#type.as_str() {
            "string" => EvaluationResult::String(
                obj.value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
            ),
            "number" => EvaluationResult::Number(
                obj.value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0),
            ),
            "boolean" => EvaluationResult::Bool(
                obj.value.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            "undefined" => EvaluationResult::Null,
            "object" if obj.subtype.as_deref() == Some("null") => EvaluationResult::Null,
            "object" | "function" | "bigint" | "symbol" => {
                EvaluationResult::Object(obj.value.clone().unwrap_or(serde_json::Value::Null))
            }
            other => {
                debug!("parse_remote_object: unknown type '{}', returning Null", other);
                EvaluationResult::Null
            }
        }
    }

    /// Decode an evaluation-shaped response, turning thrown exceptions into errors
    fn decode_evaluation(result: serde_json::Value) -> Result<RemoteObject, Error> {
        let response: EvaluateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse EvaluateResponse: {}", e)))?;

        if let Some(exception) = response.exception_details {
            return Err(Error::script_execution_failed(exception.message()));
        }

        Ok(response.result)
    }
}

#[async_trait]
impl CdpClient for CdpClientImpl {
    /// Get the underlying connection
    fn connection(&self) -> Arc<dyn CdpConnection> {
        Arc::clone(&self.connection)
    }

    /// Start a navigation
    async fn navigate(&self, url: &str) -> Result<NavigationResult, Error> {
        info!("Navigating to {}", url);

        let params = NavigateParams {
            url: url.to_string(),
            referrer: None,
            transition_type: None,
        };

        let result = self
            .call_method("Page.navigate", serde_json::to_value(params)?)
            .await?;

        let response: NavigateResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse Page.navigate response: {}", e)))?;

        Ok(NavigationResult {
            frame_id: response.frame_id,
            loader_id: response.loader_id,
            url: url.to_string(),
            error_text: response.error_text.filter(|t| !t.is_empty()),
        })
    }

    /// Evaluate JavaScript in the page
    async fn evaluate(&self, script: &str, await_promise: bool) -> Result<EvaluationResult, Error> {
        debug!("Evaluating script: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(await_promise),
            return_by_value: Some(true),
            context_id: None,
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        let remote_obj = Self::decode_evaluation(result)?;
        Ok(Self::parse_remote_object(&remote_obj))
    }

    /// Evaluate JavaScript and keep the result as a remote handle
    async fn evaluate_handle(&self, script: &str) -> Result<RemoteObject, Error> {
        debug!("Evaluating script for handle: {}", script);

        let params = EvaluateParams {
            expression: script.to_string(),
            await_promise: Some(false),
            return_by_value: Some(false),
            context_id: None,
        };

        let result = self
            .call_method("Runtime.evaluate", serde_json::to_value(params)?)
            .await?;

        Self::decode_evaluation(result)
    }

    async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<serde_json::Value>,
    ) -> Result<EvaluationResult, Error> {
        let params = CallFunctionOnParams {
            function_declaration: function_declaration.to_string(),
            object_id: object_id.to_string(),
            arguments: arguments
                .into_iter()
                .map(|value| CallArgument { value })
                .collect(),
            return_by_value: true,
            await_promise: false,
        };

        let result = self
            .call_method("Runtime.callFunctionOn", serde_json::to_value(params)?)
            .await?;

        let remote_obj = Self::decode_evaluation(result)?;
        Ok(Self::parse_remote_object(&remote_obj))
    }

    async fn get_properties(&self, object_id: &str) -> Result<Vec<PropertyDescriptor>, Error> {
        let result = self
            .call_method(
                "Runtime.getProperties",
                serde_json::json!({
                    "objectId": object_id,
                    "ownProperties": true,
                }),
            )
            .await?;

        let response: GetPropertiesResponse = serde_json::from_value(result)
            .map_err(|e| Error::cdp(format!("Failed to parse GetPropertiesResponse: {}", e)))?;

        if let Some(exception) = response.exception_details {
            return Err(Error::script_execution_failed(exception.message()));
        }

        Ok(response.result)
    }

    async fn release_object(&self, object_id: &str) -> Result<(), Error> {
        self.call_method(
            "Runtime.releaseObject",
            serde_json::json!({ "objectId": object_id }),
        )
        .await?;
        Ok(())
    }

    /// Get page content
    async fn get_content(&self) -> Result<String, Error> {
        match self.evaluate("document.documentElement.outerHTML", false).await? {
            EvaluationResult::String(html) => Ok(html),
            _ => Ok(String::new()),
        }
    }

    /// Replace the main frame's document
    async fn set_content(&self, html: &str) -> Result<(), Error> {
        debug!("Setting page content ({} bytes)", html.len());

        let tree = self
            .call_method("Page.getFrameTree", serde_json::json!({}))
            .await?;
        let tree: FrameTreeResponse = serde_json::from_value(tree)
            .map_err(|e| Error::cdp(format!("Failed to parse frame tree: {}", e)))?;

        self.call_method(
            "Page.setDocumentContent",
            serde_json::json!({
                "frameId": tree.frame_tree.frame.id,
                "html": html,
            }),
        )
        .await?;

        Ok(())
    }

    /// Enable a domain
    async fn enable_domain(&self, domain: &str) -> Result<(), Error> {
        debug!("Enabling domain: {}", domain);

        let method = format!("{}.enable", domain);
        self.call_method(&method, serde_json::json!({})).await?;

        Ok(())
    }

    /// Call a raw CDP method
    async fn call_method(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value, Error> {
        let response = self.connection.send_command(method, params).await?;

        response.result.ok_or_else(|| Error::cdp("No result in response"))
    }

    /// Subscribe to events
    async fn subscribe_events(&self, event_type: &str) -> Result<tokio::sync::mpsc::Receiver<CdpEvent>, Error> {
        debug!("Subscribing to events: {}", event_type);

        let mut event_receiver = self.connection.listen_events().await?;

        let (tx, rx) = tokio::sync::mpsc::channel(100);
        let filter_event_type = event_type.to_string();

        tokio::spawn(async move {
            while let Some(event) = event_receiver.recv().await {
                if (event.method == filter_event_type || filter_event_type == "*")
                    && tx.send(event).await.is_err()
                {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(kind: &str, subtype: Option<&str>, value: Option<serde_json::Value>) -> RemoteObject {
        RemoteObject {
            r#type: kind.to_string(),
            subtype: subtype.map(str::to_string),
            value,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_remote_object_string() {
        let obj = remote("string", None, Some(serde_json::json!("test")));
        let result = CdpClientImpl::parse_remote_object(&obj);
        assert!(matches!(result, EvaluationResult::String(s) if s == "test"));
    }

    #[test]
    fn test_parse_remote_object_number() {
        let obj = remote("number", None, Some(serde_json::json!(42.5)));
        let result = CdpClientImpl::parse_remote_object(&obj);
        assert!(matches!(result, EvaluationResult::Number(n) if n == 42.5));
    }

    #[test]
    fn test_parse_remote_object_bool() {
        let obj = remote("boolean", None, Some(serde_json::json!(true)));
        assert_eq!(CdpClientImpl::parse_remote_object(&obj), EvaluationResult::Bool(true));
    }

    #[test]
    fn test_parse_remote_object_null_subtype() {
        // getAttribute() of a missing attribute comes back as object/null
        let obj = remote("object", Some("null"), Some(serde_json::Value::Null));
        assert_eq!(CdpClientImpl::parse_remote_object(&obj), EvaluationResult::Null);
    }

    #[test]
    fn test_parse_remote_object_undefined() {
        let obj = remote("undefined", None, None);
        assert_eq!(CdpClientImpl::parse_remote_object(&obj), EvaluationResult::Null);
    }

    #[test]
    fn test_decode_evaluation_exception() {
        let result = CdpClientImpl::decode_evaluation(serde_json::json!({
            "result": { "type": "object" },
            "exceptionDetails": {
                "text": "Uncaught",
                "exception": { "type": "object", "description": "ReferenceError: foo is not defined" }
            }
        }));

        match result {
            Err(Error::ScriptExecutionFailed(msg)) => assert!(msg.contains("ReferenceError")),
            other => panic!("expected script failure, got {:?}", other),
        }
    }
}
