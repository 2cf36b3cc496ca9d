//! CDP (Chrome DevTools Protocol) type definitions
//!
//! This module defines the wire structures exchanged with the browser.

use serde::{Deserialize, Serialize};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Session ID for multi-session targets
    #[serde(skip_serializing_if = "Option::is_none", rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC notification (event)
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    /// Event method (e.g., "Page.lifecycleEvent")
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: serde_json::Value,
    /// Session ID for multi-session targets
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
    /// Referrer URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Transition type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<String>,
}

/// Page navigation response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigateResponse {
    /// Frame the navigation happened in
    pub frame_id: String,
    /// Loader ID; absent for same-document navigations
    #[serde(default)]
    pub loader_id: Option<String>,
    /// Set when the navigation failed (e.g. `net::ERR_NAME_NOT_RESOLVED`)
    #[serde(default)]
    pub error_text: Option<String>,
}

/// JavaScript evaluation parameters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub await_promise: Option<bool>,
    /// Whether to return as value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_by_value: Option<bool>,
    /// Execution context ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<i64>,
}

/// Parameters for `Runtime.callFunctionOn`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnParams {
    /// Function source, invoked with `this` bound to the object
    pub function_declaration: String,
    /// Remote object the function is called on
    pub object_id: String,
    /// Call arguments
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<CallArgument>,
    /// Whether to return as value
    pub return_by_value: bool,
    /// Whether to await promise
    pub await_promise: bool,
}

/// Argument for `Runtime.callFunctionOn`
#[derive(Debug, Clone, Serialize)]
pub struct CallArgument {
    /// Primitive value
    pub value: serde_json::Value,
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object class name
    #[serde(default)]
    pub class_name: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
    /// Unserializable value
    #[serde(default)]
    pub unserializable_value: Option<String>,
    /// Handle for objects not returned by value
    #[serde(default)]
    pub object_id: Option<String>,
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception ID
    #[serde(default)]
    pub exception_id: i32,
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Line number
    #[serde(default)]
    pub line_number: i32,
    /// Column number
    #[serde(default)]
    pub column_number: i32,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Best human-readable message for the exception
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// JavaScript evaluation response (`Runtime.evaluate` / `Runtime.callFunctionOn`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// Object property descriptor (`Runtime.getProperties`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Property value, absent for accessors
    #[serde(default)]
    pub value: Option<RemoteObject>,
    /// Whether the property is an own property
    #[serde(default)]
    pub is_own: Option<bool>,
}

/// `Runtime.getProperties` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResponse {
    /// Object properties
    #[serde(default)]
    pub result: Vec<PropertyDescriptor>,
    /// Exception details if the lookup threw
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

/// `Page.lifecycleEvent` parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleEventParams {
    /// Frame the event belongs to
    pub frame_id: String,
    /// Loader the event belongs to
    pub loader_id: String,
    /// Lifecycle name (`load`, `DOMContentLoaded`, `networkIdle`, ...)
    pub name: String,
}

/// `Network.responseReceived` parameters (subset)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseReceivedParams {
    /// Loader the response belongs to
    #[serde(default)]
    pub loader_id: Option<String>,
    /// Resource type (`Document`, `Image`, ...)
    #[serde(default)]
    pub r#type: Option<String>,
    /// Response summary
    pub response: ResponseSummary,
}

/// HTTP response summary inside `Network.responseReceived`
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseSummary {
    /// Response URL
    pub url: String,
    /// HTTP status code
    pub status: f64,
}

/// Frame tree (`Page.getFrameTree`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameTreeResponse {
    /// Root of the frame tree
    pub frame_tree: FrameTree,
}

/// Frame tree node
#[derive(Debug, Clone, Deserialize)]
pub struct FrameTree {
    /// Frame in this node
    pub frame: Frame,
}

/// Frame description
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    /// Frame ID
    pub id: String,
    /// Frame document URL
    #[serde(default)]
    pub url: String,
}
