use serde_json::json;

use super::message_utils::format_message;
use super::records::PageCursor;
use super::schema::{ParamSpec, Params, ToolSpec};
use super::{
    CONVERSATIONS_MAX_PAGE_SIZE, CURSOR, Payload, Plan, SlackTool, ToolResponse, page_limit,
};
use crate::error::McpResult;
use crate::slack::types::{ConversationsHistoryResponse, PostMessageResponse};
use crate::slack::{SlackMethod, UpstreamCall};
use crate::utils::{normalize_reaction, parse_payload};

pub struct PostMessageTool;

pub struct ReplyToThreadTool;

pub struct AddReactionTool;

pub struct GetChannelHistoryTool;

pub struct GetThreadRepliesTool;

const CHANNEL_ID: ParamSpec =
    ParamSpec::string("channel_id", "The ID of the channel").required();

static POST_MESSAGE: ToolSpec = ToolSpec {
    name: "slack_post_message",
    description: "Post a new message to a Slack channel.",
    params: &[
        ParamSpec::string("channel_id", "The ID of the channel to post to").required(),
        ParamSpec::string("text", "The message text to post").required(),
    ],
};

static REPLY_TO_THREAD: ToolSpec = ToolSpec {
    name: "slack_reply_to_thread",
    description: "Reply to a specific message thread in Slack.",
    params: &[
        CHANNEL_ID,
        ParamSpec::string("thread_ts", "The timestamp of the parent message").required(),
        ParamSpec::string("text", "The reply text").required(),
        ParamSpec::boolean(
            "reply_broadcast",
            "Also post the reply to the channel (default: false)",
        )
        .default_bool(false),
    ],
};

static ADD_REACTION: ToolSpec = ToolSpec {
    name: "slack_add_reaction",
    description: "Add a reaction emoji to a message.",
    params: &[
        CHANNEL_ID,
        ParamSpec::string("timestamp", "The timestamp of the message").required(),
        ParamSpec::string("reaction", "The emoji name (without colons)").required(),
    ],
};

static GET_CHANNEL_HISTORY: ToolSpec = ToolSpec {
    name: "slack_get_channel_history",
    description: "Get messages from a channel in chronological order. Use this when you need \
                  the latest conversation flow without specific filters, want all messages \
                  including bot/automation messages, or need to browse sequentially with \
                  pagination. Do NOT use if you have specific search criteria - use \
                  slack_search_messages instead.",
    params: &[
        CHANNEL_ID,
        page_limit(
            "Maximum number of messages to return (default: 100)",
            CONVERSATIONS_MAX_PAGE_SIZE,
        ),
        CURSOR,
    ],
};

static GET_THREAD_REPLIES: ToolSpec = ToolSpec {
    name: "slack_get_thread_replies",
    description: "Get all replies in a message thread.",
    params: &[
        CHANNEL_ID,
        ParamSpec::string("thread_ts", "The timestamp of the parent message").required(),
        page_limit(
            "Maximum number of replies to return (default: 100)",
            CONVERSATIONS_MAX_PAGE_SIZE,
        ),
        CURSOR,
    ],
};

fn acknowledge(message: &str, payload: Payload) -> McpResult<ToolResponse> {
    let response: PostMessageResponse =
        parse_payload(SlackMethod::ChatPostMessage.as_str(), payload.one()?)?;

    let mut data = json!({
        "ok": true,
        "message": message,
    });
    if let Some(channel) = response.channel {
        data["channel"] = json!(channel);
    }
    if let Some(ts) = response.ts {
        data["ts"] = json!(ts);
    }
    Ok(ToolResponse::data(data))
}

fn shape_messages(method: SlackMethod, payload: Payload) -> McpResult<ToolResponse> {
    let response: ConversationsHistoryResponse = parse_payload(method.as_str(), payload.one()?)?;

    let messages: Vec<_> = response.messages.iter().map(format_message).collect();

    Ok(ToolResponse::data(json!({ "messages": messages }))
        .paginated(PageCursor::from_metadata(&response.response_metadata)))
}

impl SlackTool for PostMessageTool {
    fn spec(&self) -> &'static ToolSpec {
        &POST_MESSAGE
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ChatPostMessage)
                .param("channel", params.require_str("channel_id")?)
                .param("text", params.require_str("text")?),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        acknowledge("Message posted successfully", payload)
    }
}

impl SlackTool for ReplyToThreadTool {
    fn spec(&self) -> &'static ToolSpec {
        &REPLY_TO_THREAD
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ChatPostMessage)
                .param("channel", params.require_str("channel_id")?)
                .param("thread_ts", params.require_str("thread_ts")?)
                .param("text", params.require_str("text")?)
                .param(
                    "reply_broadcast",
                    params.bool("reply_broadcast").unwrap_or(false),
                ),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        acknowledge("Reply sent to thread successfully", payload)
    }
}

impl SlackTool for AddReactionTool {
    fn spec(&self) -> &'static ToolSpec {
        &ADD_REACTION
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ReactionsAdd)
                .param("channel", params.require_str("channel_id")?)
                .param("timestamp", params.require_str("timestamp")?)
                .param("name", normalize_reaction(params.require_str("reaction")?)),
        ))
    }

    // reactions.add answers with a bare `ok`
    fn shape(&self, params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        payload.one()?;
        Ok(ToolResponse::data(json!({
            "ok": true,
            "message": "Reaction added successfully",
            "channel": params.require_str("channel_id")?,
            "ts": params.require_str("timestamp")?,
        })))
    }
}

impl SlackTool for GetChannelHistoryTool {
    fn spec(&self) -> &'static ToolSpec {
        &GET_CHANNEL_HISTORY
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ConversationsHistory)
                .param("channel", params.require_str("channel_id")?)
                .param("limit", params.require_int("limit")?)
                .param_opt("cursor", params.str("cursor")),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        shape_messages(SlackMethod::ConversationsHistory, payload)
    }
}

impl SlackTool for GetThreadRepliesTool {
    fn spec(&self) -> &'static ToolSpec {
        &GET_THREAD_REPLIES
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::ConversationsReplies)
                .param("channel", params.require_str("channel_id")?)
                .param("ts", params.require_str("thread_ts")?)
                .param("limit", params.require_int("limit")?)
                .param_opt("cursor", params.str("cursor")),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        shape_messages(SlackMethod::ConversationsReplies, payload)
    }
}
