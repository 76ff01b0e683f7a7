use super::records::SearchMatch;
use super::schema::{ParamSpec, Params, ToolSpec};
use super::{Payload, Plan, SlackTool, ToolResponse};
use crate::error::{McpError, McpResult, ValidationError};
use crate::slack::types::SearchMessagesResponse;
use crate::slack::{SlackMethod, UpstreamCall};
use crate::utils::{looks_like_channel_id, looks_like_user_id, parse_payload};

pub struct SearchMessagesTool;

static SEARCH_MESSAGES: ToolSpec = ToolSpec {
    name: "slack_search_messages",
    description: "Search for messages with specific criteria/filters. Use this when you need \
                  to find messages from a specific user, messages in a specific date range, \
                  or messages containing specific keywords. Results are paged by page number; \
                  pass next_page to continue.",
    params: &[
        ParamSpec::string("query", "Search keywords (Slack search syntax is allowed)"),
        ParamSpec::string("in_channel", "Channel ID or name to search in"),
        ParamSpec::string("from_user", "User ID or username whose messages to search"),
        ParamSpec::date("before", "Only messages before this date (YYYY-MM-DD)"),
        ParamSpec::date("after", "Only messages after this date (YYYY-MM-DD)"),
        ParamSpec::date("on", "Only messages on this date (YYYY-MM-DD)"),
        ParamSpec::string(
            "during",
            "Only messages during this period, e.g. 'july' or '2024'",
        ),
        ParamSpec::boolean("highlight", "Highlight matching terms (default: false)")
            .default_bool(false),
        ParamSpec::string("sort", "Sort by relevance or recency (default: score)")
            .one_of(&["score", "timestamp"])
            .default_str("score"),
        ParamSpec::string("sort_dir", "Sort direction (default: desc)")
            .one_of(&["asc", "desc"])
            .default_str("desc"),
        ParamSpec::integer("count", "Results per page (default: 20)")
            .default_int(20)
            .range(1, 100),
        ParamSpec::integer("page", "Page number (default: 1)")
            .default_int(1)
            .range(1, 100),
    ],
};

/// Compose the Slack search string from the free-text query and the
/// structured filters.
fn build_query(params: &Params) -> Result<String, ValidationError> {
    let mut parts: Vec<String> = Vec::new();

    if let Some(query) = params.str("query") {
        parts.push(query.trim().to_string());
    }

    if let Some(channel) = params.str("in_channel") {
        let channel = channel.trim().trim_start_matches('#');
        if looks_like_channel_id(channel) {
            parts.push(format!("in:<#{}>", channel));
        } else {
            parts.push(format!("in:#{}", channel));
        }
    }

    if let Some(user) = params.str("from_user") {
        let user = user.trim().trim_start_matches('@');
        if looks_like_user_id(user) {
            parts.push(format!("from:<@{}>", user));
        } else {
            parts.push(format!("from:@{}", user));
        }
    }

    for modifier in ["before", "after", "on", "during"] {
        if let Some(value) = params.str(modifier) {
            parts.push(format!("{}:{}", modifier, value.trim()));
        }
    }

    if parts.is_empty() {
        return Err(ValidationError::missing("query"));
    }
    Ok(parts.join(" "))
}

impl SlackTool for SearchMessagesTool {
    fn spec(&self) -> &'static ToolSpec {
        &SEARCH_MESSAGES
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::user(SlackMethod::SearchMessages)
                .param("query", build_query(params)?)
                .param("highlight", params.bool("highlight").unwrap_or(false))
                .param("sort", params.require_str("sort")?)
                .param("sort_dir", params.require_str("sort_dir")?)
                .param("count", params.require_int("count")?)
                .param("page", params.require_int("page")?),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let response: SearchMessagesResponse =
            parse_payload(SlackMethod::SearchMessages.as_str(), payload.one()?)?;
        let messages = response.messages;

        let matches = messages
            .matches
            .into_iter()
            .map(|payload| {
                SearchMatch::from_payload(payload).ok_or_else(|| {
                    McpError::Mapping("search.messages match without channel".to_string())
                })
            })
            .collect::<McpResult<Vec<_>>>()?;

        Ok(ToolResponse::search_matches(
            messages.total,
            matches,
            messages.paging,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::TokenKind;
    use crate::tools::schema::validate;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn query_for(args: Value) -> Result<String, ValidationError> {
        let params = validate(&SEARCH_MESSAGES, args).unwrap();
        build_query(&params)
    }

    #[test]
    fn test_build_query_with_filters() {
        assert_eq!(
            query_for(json!({
                "query": "deploy failed",
                "in_channel": "C0123ABCD",
                "from_user": "U0456EFGH",
                "after": "2024-01-01"
            }))
            .unwrap(),
            "deploy failed in:<#C0123ABCD> from:<@U0456EFGH> after:2024-01-01"
        );
    }

    #[test]
    fn test_build_query_with_names() {
        assert_eq!(
            query_for(json!({"in_channel": "#general", "from_user": "@ada"})).unwrap(),
            "in:#general from:@ada"
        );
    }

    #[test]
    fn test_empty_query_rejected() {
        let err = query_for(json!({"query": "   "})).unwrap_err();
        assert_eq!(err, ValidationError::missing("query"));
    }

    #[test]
    fn test_plan_uses_user_token() {
        let params = validate(&SEARCH_MESSAGES, json!({"query": "incident", "page": 3})).unwrap();
        let Plan::One(call) = SearchMessagesTool.plan(&params).unwrap() else {
            panic!("expected a single call");
        };

        assert_eq!(call.token, TokenKind::User);
        assert_eq!(call.params["page"], "3");
        assert_eq!(call.params["count"], "20");
        assert_eq!(call.params["sort"], "score");
    }

    #[test]
    fn test_shape_reports_next_page() {
        let params = validate(&SEARCH_MESSAGES, json!({"query": "incident"})).unwrap();
        let result = SearchMessagesTool
            .shape(
                &params,
                Payload::One(json!({
                    "ok": true,
                    "messages": {
                        "total": 42,
                        "matches": [{
                            "type": "message",
                            "user": "U1",
                            "username": "ada",
                            "text": "incident resolved",
                            "ts": "1700000000.000100",
                            "channel": {"id": "C1", "name": "ops"},
                            "permalink": "https://example.slack.com/archives/C1/p1700000000000100"
                        }],
                        "paging": {"count": 20, "total": 42, "page": 1, "pages": 3}
                    }
                })),
            )
            .unwrap()
            .into_json()
            .unwrap();

        assert_eq!(result["messages"]["total"], 42);
        assert_eq!(result["messages"]["matches"][0]["channel"]["kind"], "public_channel");
        assert_eq!(result["next_page"], 2);
        assert!(result.get("next_cursor").is_none());
    }

    #[test]
    fn test_match_without_channel_is_mapping_error() {
        let params = validate(&SEARCH_MESSAGES, json!({"query": "incident"})).unwrap();
        let err = SearchMessagesTool
            .shape(
                &params,
                Payload::One(json!({
                    "ok": true,
                    "messages": {"total": 1, "matches": [{"text": "orphan", "ts": "1.0"}]}
                })),
            )
            .unwrap_err();

        assert!(matches!(err, McpError::Mapping(_)));
    }
}
