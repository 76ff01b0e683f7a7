//! The fixed stage order every tool call runs through:
//! validate, invoke, shape, filter, render.
//!
//! Tools only supply the parts that differ (their parameter table, the
//! upstream call, and the shaping). The order lives here and nowhere else,
//! and the filter stage is the only producer of renderable output.

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::SlackTool;
use super::safe_search::SafeSearchPolicy;
use super::schema::validate;
use crate::error::{McpError, McpResult, UpstreamError};
use crate::slack::{SlackApi, UpstreamCall};

/// What a tool asks the invoker to send.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// A single call; its failure fails the tool.
    One(UpstreamCall),
    /// One call per keyed item; failures are kept per item.
    EachOf(Vec<(String, UpstreamCall)>),
}

/// What the invoker hands to the shaper.
#[derive(Debug)]
pub enum Payload {
    One(Value),
    EachOf(Vec<(String, Result<Value, UpstreamError>)>),
}

impl Payload {
    pub fn one(self) -> McpResult<Value> {
        match self {
            Payload::One(value) => Ok(value),
            Payload::EachOf(_) => Err(McpError::Mapping(
                "expected a single upstream payload".to_string(),
            )),
        }
    }

    pub fn each(self) -> McpResult<Vec<(String, Result<Value, UpstreamError>)>> {
        match self {
            Payload::EachOf(items) => Ok(items),
            Payload::One(_) => Err(McpError::Mapping(
                "expected per-item upstream payloads".to_string(),
            )),
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    api: Arc<dyn SlackApi>,
    policy: SafeSearchPolicy,
}

impl Pipeline {
    pub fn new(api: Arc<dyn SlackApi>, policy: SafeSearchPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> SafeSearchPolicy {
        self.policy
    }

    #[instrument(level = "debug", skip_all, fields(tool = tool.spec().name))]
    pub async fn run(&self, tool: &dyn SlackTool, arguments: Value) -> McpResult<Value> {
        let spec = tool.spec();

        let params = validate(spec, arguments)?;
        let plan = tool.plan(&params)?;
        let payload = self.invoke(plan).await?;
        let shaped = tool.shape(&params, payload).inspect_err(|e| {
            if let McpError::Mapping(detail) = e {
                error!(
                    tool = spec.name,
                    detail = %detail,
                    "Upstream payload did not match tool contract"
                );
            }
        })?;

        self.policy.apply(spec.name, shaped).into_json()
    }

    async fn invoke(&self, plan: Plan) -> McpResult<Payload> {
        match plan {
            Plan::One(call) => {
                debug!(method = call.method.as_str(), "Invoking upstream");
                let value = self.api.call(&call).await.inspect_err(|e| log_upstream(&call, e))?;
                Ok(Payload::One(value))
            }
            Plan::EachOf(calls) => {
                let mut results = Vec::with_capacity(calls.len());
                for (key, call) in calls {
                    debug!(method = call.method.as_str(), key = %key, "Invoking upstream");
                    let result = self.api.call(&call).await;
                    if let Err(e) = &result {
                        log_upstream(&call, e);
                    }
                    results.push((key, result));
                }
                Ok(Payload::EachOf(results))
            }
        }
    }
}

fn log_upstream(call: &UpstreamCall, err: &UpstreamError) {
    warn!(
        method = call.method.as_str(),
        classification = err.classification(),
        error = %err,
        "Slack call failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::SlackMethod;
    use crate::slack::client::MockSlackApi;
    use crate::tools::channels::ListChannelsTool;
    use crate::tools::users::GetUserProfilesTool;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn pipeline(api: MockSlackApi, safe_search: bool) -> Pipeline {
        Pipeline::new(Arc::new(api), SafeSearchPolicy::new(safe_search))
    }

    #[tokio::test]
    async fn test_validation_failure_never_invokes_upstream() {
        let mut api = MockSlackApi::new();
        api.expect_call().times(0);

        let err = pipeline(api, false)
            .run(&ListChannelsTool, json!({"limit": 5000}))
            .await
            .unwrap_err();

        assert!(matches!(err, McpError::Validation(ref v) if v.field == "limit"));
    }

    #[tokio::test]
    async fn test_upstream_error_propagates_without_retry() {
        let mut api = MockSlackApi::new();
        api.expect_call().times(1).returning(|_| {
            Err(UpstreamError::RateLimited {
                retry_after_secs: Some(5),
            })
        });

        let err = pipeline(api, false)
            .run(&ListChannelsTool, json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, McpError::Upstream(UpstreamError::RateLimited { .. })));
    }

    #[tokio::test]
    async fn test_mapping_error_on_malformed_payload() {
        let mut api = MockSlackApi::new();
        api.expect_call()
            .times(1)
            .returning(|_| Ok(json!({"ok": true, "channels": "not-a-list"})));

        let err = pipeline(api, false)
            .run(&ListChannelsTool, json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, McpError::Mapping(_)));
    }

    #[tokio::test]
    async fn test_each_of_keeps_per_item_failures() {
        let mut api = MockSlackApi::new();
        api.expect_call()
            .withf(|call| call.method == SlackMethod::UsersProfileGet)
            .times(2)
            .returning(|call| match call.params.get("user").map(String::as_str) {
                Some("U1") => Ok(json!({"ok": true, "profile": {"real_name": "Ada"}})),
                _ => Err(UpstreamError::Other {
                    code: "user_not_found".to_string(),
                }),
            });

        let result = pipeline(api, false)
            .run(&GetUserProfilesTool, json!({"user_ids": ["U1", "U2"]}))
            .await
            .unwrap();

        assert_eq!(result["profiles"][0]["user_id"], "U1");
        assert_eq!(result["profiles"][0]["profile"]["real_name"], "Ada");
        assert_eq!(result["profiles"][1]["user_id"], "U2");
        assert_eq!(result["profiles"][1]["error"], "user_not_found");
    }
}
