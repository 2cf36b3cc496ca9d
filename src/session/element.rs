//! Element reference implementation
//!
//! Elements are Runtime remote objects; every read is a `Runtime.callFunctionOn`
//! with `this` bound to the element.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::cdp::traits::{CdpClient, EvaluationResult};
use crate::session::traits::ElementRef;
use crate::Error;

const TEXT_CONTENT: &str = "function() { return this.textContent; }";
const INNER_HTML: &str = "function() { return this.innerHTML; }";
const GET_ATTRIBUTE: &str = "function(name) { return this.getAttribute(name); }";

/// Element reference implementation
pub struct ElementRefImpl {
    id: String,
    page_id: String,
    object_id: String,
    cdp_client: Arc<dyn CdpClient>,
}

impl std::fmt::Debug for ElementRefImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRefImpl")
            .field("id", &self.id)
            .field("page_id", &self.page_id)
            .field("object_id", &self.object_id)
            .finish()
    }
}

impl ElementRefImpl {
    /// Create a new element reference
    pub fn new(page_id: String, object_id: String, cdp_client: Arc<dyn CdpClient>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            page_id,
            object_id,
            cdp_client,
        }
    }

    /// Remote object ID of the element
    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    async fn call(&self, declaration: &str, arguments: Vec<serde_json::Value>) -> Result<EvaluationResult, Error> {
        self.cdp_client
            .call_function_on(&self.object_id, declaration, arguments)
            .await
            .map_err(|e| match e {
                // Stale handles surface as "Could not find object with given id"
                Error::Cdp(msg) if msg.contains("Could not find object") => {
                    Error::element_not_found(format!("{} ({})", self.id, msg))
                }
                other => other,
            })
    }

    async fn call_for_string(&self, declaration: &str) -> Result<String, Error> {
        match self.call(declaration, vec![]).await? {
            EvaluationResult::String(s) => Ok(s),
            // textContent is null only for documents and doctypes
            EvaluationResult::Null => Ok(String::new()),
            other => Err(Error::script_execution_failed(format!(
                "Expected a string from element {}, got {:?}",
                self.id, other
            ))),
        }
    }
}

#[async_trait]
impl ElementRef for ElementRefImpl {
    fn id(&self) -> &str {
        &self.id
    }

    fn page_id(&self) -> &str {
        &self.page_id
    }

    async fn text_content(&self) -> Result<String, Error> {
        self.call_for_string(TEXT_CONTENT).await
    }

    async fn inner_html(&self) -> Result<String, Error> {
        self.call_for_string(INNER_HTML).await
    }

    async fn get_attribute(&self, name: &str) -> Result<Option<String>, Error> {
        match self.call(GET_ATTRIBUTE, vec![serde_json::json!(name)]).await? {
            EvaluationResult::String(value) => Ok(Some(value)),
            EvaluationResult::Null => Ok(None),
            other => Err(Error::script_execution_failed(format!(
                "Unexpected attribute value for '{}': {:?}",
                name, other
            ))),
        }
    }
}
