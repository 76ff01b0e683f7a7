use super::records::{ConversationRecord, PageCursor};
use super::schema::{ParamSpec, Params, ToolSpec};
use super::{
    CONVERSATIONS_MAX_PAGE_SIZE, CURSOR, Payload, Plan, SlackTool, ToolResponse, page_limit,
};
use crate::error::McpResult;
use crate::slack::types::ConversationsListResponse;
use crate::slack::{SlackMethod, UpstreamCall};
use crate::utils::parse_payload;

const CONVERSATION_TYPES: &[&str] = &["public_channel", "private_channel", "mpim", "im"];

// Substring search scans one upstream page of this size per request.
const SEARCH_PAGE_SIZE: i64 = 200;

pub struct ListChannelsTool;

pub struct SearchChannelsTool;

static LIST_CHANNELS: ToolSpec = ToolSpec {
    name: "slack_list_channels",
    description: "List channels in the workspace with pagination. Pass the returned \
                  next_cursor to fetch the following page.",
    params: &[
        page_limit(
            "Maximum number of channels to return (default: 100)",
            CONVERSATIONS_MAX_PAGE_SIZE,
        ),
        CURSOR,
        ParamSpec::string(
            "types",
            "Comma-separated conversation types: public_channel, private_channel, mpim, im \
             (default: public_channel)",
        )
        .one_of(CONVERSATION_TYPES)
        .comma_separated()
        .default_str("public_channel"),
        ParamSpec::boolean("exclude_archived", "Skip archived channels (default: false)")
            .default_bool(false),
    ],
};

static SEARCH_CHANNELS: ToolSpec = ToolSpec {
    name: "slack_search_channels",
    description: "Search for channels by partial name match. Use this when you need to find \
                  channels containing specific keywords in their names. Each call scans one \
                  page of channels; pass next_cursor to continue scanning.",
    params: &[
        ParamSpec::string("query", "Search query to match against channel names").required(),
        ParamSpec::integer(
            "limit",
            "Maximum number of channels to return (default: 20)",
        )
        .default_int(20)
        .range(1, SEARCH_PAGE_SIZE),
        CURSOR,
    ],
};

/// Strip whitespace the caller may have put around list items.
fn normalize_types(types: &str) -> String {
    types
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

impl SlackTool for ListChannelsTool {
    fn spec(&self) -> &'static ToolSpec {
        &LIST_CHANNELS
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ConversationsList)
                .param("limit", params.require_int("limit")?)
                .param_opt("cursor", params.str("cursor"))
                .param("types", normalize_types(params.require_str("types")?))
                .param(
                    "exclude_archived",
                    params.bool("exclude_archived").unwrap_or(false),
                ),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let response: ConversationsListResponse =
            parse_payload(SlackMethod::ConversationsList.as_str(), payload.one()?)?;

        let records = response
            .channels
            .iter()
            .map(ConversationRecord::from_channel)
            .collect();

        Ok(ToolResponse::conversations("channels", records)
            .paginated(PageCursor::from_metadata(&response.response_metadata)))
    }
}

impl SlackTool for SearchChannelsTool {
    fn spec(&self) -> &'static ToolSpec {
        &SEARCH_CHANNELS
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ConversationsList)
                .param("limit", SEARCH_PAGE_SIZE)
                .param_opt("cursor", params.str("cursor"))
                .param("types", "public_channel")
                .param("exclude_archived", true),
        ))
    }

    fn shape(&self, params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let response: ConversationsListResponse =
            parse_payload(SlackMethod::ConversationsList.as_str(), payload.one()?)?;
        let query = params.require_str("query")?.trim().to_lowercase();
        let limit = params.require_int("limit")? as usize;

        let records = response
            .channels
            .iter()
            .filter(|ch| !ch.is_archived)
            .filter(|ch| {
                ch.name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&query))
            })
            .take(limit)
            .map(|ch| ConversationRecord::from_channel(ch).with_purpose(ch))
            .collect();

        Ok(ToolResponse::conversations("channels", records)
            .with_total()
            .paginated(PageCursor::from_metadata(&response.response_metadata)))
    }
}
