pub mod channels;
pub mod message_utils;
pub mod messages;
pub mod pipeline;
pub mod records;
pub mod response;
pub mod safe_search;
pub mod schema;
pub mod search;
pub mod users;

use crate::error::McpResult;

pub use pipeline::{Payload, Pipeline, Plan};
pub use records::{ConversationKind, ConversationRecord, PageCursor};
pub use response::ToolResponse;
pub use safe_search::{Filtered, SafeSearchPolicy};
pub use schema::{ParamSpec, Params, ToolSpec};

const DEFAULT_PAGE_SIZE: i64 = 100;

/// `conversations.*` methods take a limit under 1000.
pub(crate) const CONVERSATIONS_MAX_PAGE_SIZE: i64 = 999;

/// `users.list` accepts up to 1000 members per page.
pub(crate) const USERS_MAX_PAGE_SIZE: i64 = 1000;

pub(crate) const CURSOR: ParamSpec = ParamSpec::string("cursor", "Pagination cursor for next page");

pub(crate) const fn page_limit(description: &'static str, max: i64) -> ParamSpec {
    ParamSpec::integer("limit", description)
        .default_int(DEFAULT_PAGE_SIZE)
        .range(1, max)
}

/// A tool is a parameter table plus the two steps that differ per tool:
/// building the upstream call and shaping its payload. Everything else runs
/// in [`Pipeline`].
pub trait SlackTool: Send + Sync {
    fn spec(&self) -> &'static ToolSpec;

    fn plan(&self, params: &Params) -> McpResult<Plan>;

    fn shape(&self, params: &Params, payload: Payload) -> McpResult<ToolResponse>;
}

/// Every tool exposed over MCP, in listing order.
pub fn all_tools() -> Vec<Box<dyn SlackTool>> {
    vec![
        Box::new(channels::ListChannelsTool),
        Box::new(messages::PostMessageTool),
        Box::new(messages::ReplyToThreadTool),
        Box::new(messages::AddReactionTool),
        Box::new(messages::GetChannelHistoryTool),
        Box::new(messages::GetThreadRepliesTool),
        Box::new(users::GetUsersTool),
        Box::new(users::GetUserProfilesTool),
        Box::new(search::SearchMessagesTool),
        Box::new(channels::SearchChannelsTool),
        Box::new(users::SearchUsersTool),
    ]
}
