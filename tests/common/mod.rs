#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use slack_mcp_http::error::UpstreamError;
use slack_mcp_http::slack::{SlackApi, SlackMethod, UpstreamCall};
use slack_mcp_http::tools::{Pipeline, SafeSearchPolicy};

/// Upstream stand-in that records every call and answers from a fixed
/// table keyed by method.
#[derive(Default)]
pub struct StubSlack {
    responses: HashMap<SlackMethod, Result<Value, UpstreamError>>,
    calls: Mutex<Vec<UpstreamCall>>,
}

impl StubSlack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, method: SlackMethod, payload: Value) -> Self {
        self.responses.insert(method, Ok(payload));
        self
    }

    pub fn fail(mut self, method: SlackMethod, error: UpstreamError) -> Self {
        self.responses.insert(method, Err(error));
        self
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SlackApi for StubSlack {
    async fn call(&self, call: &UpstreamCall) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push(call.clone());
        self.responses
            .get(&call.method)
            .cloned()
            .unwrap_or_else(|| {
                Err(UpstreamError::Other {
                    code: "unknown_method".to_string(),
                })
            })
    }
}

pub fn pipeline(stub: &Arc<StubSlack>, safe_search: bool) -> Pipeline {
    Pipeline::new(stub.clone(), SafeSearchPolicy::new(safe_search))
}

/// `conversations.list` page with one public channel and one DM.
pub fn mixed_channel_page(next_cursor: &str) -> Value {
    json!({
        "ok": true,
        "channels": [
            {"id": "C1", "name": "general", "is_channel": true, "num_members": 12},
            {"id": "C2", "is_im": true, "user": "U9"}
        ],
        "response_metadata": {"next_cursor": next_cursor}
    })
}
