use serde_json::{Value, json};

use super::records::PageCursor;
use super::schema::{ParamSpec, Params, ToolSpec};
use super::{CURSOR, Payload, Plan, SlackTool, ToolResponse, USERS_MAX_PAGE_SIZE, page_limit};
use crate::error::McpResult;
use crate::slack::types::{SlackUser, UserProfileResponse, UsersListResponse};
use crate::slack::{SlackMethod, UpstreamCall};
use crate::utils::parse_payload;

const MAX_PROFILE_BATCH: i64 = 100;

// Same single-page scan as channel search.
const SEARCH_PAGE_SIZE: i64 = 200;

pub struct GetUsersTool;

pub struct GetUserProfilesTool;

pub struct SearchUsersTool;

static GET_USERS: ToolSpec = ToolSpec {
    name: "slack_get_users",
    description: "Get a list of all users in the workspace with their basic profile information.",
    params: &[
        page_limit(
            "Maximum number of users to return (default: 100)",
            USERS_MAX_PAGE_SIZE,
        ),
        CURSOR,
    ],
};

static GET_USER_PROFILES: ToolSpec = ToolSpec {
    name: "slack_get_user_profiles",
    description: "Get detailed profile information for multiple users. Users that cannot be \
                  fetched are reported individually with an error code.",
    params: &[
        ParamSpec::string_array("user_ids", "Array of user IDs to retrieve profiles for")
            .required()
            .range(1, MAX_PROFILE_BATCH),
    ],
};

static SEARCH_USERS: ToolSpec = ToolSpec {
    name: "slack_search_users",
    description: "Search for users by partial name match across username, display name, and \
                  real name. Each call scans one page of users; pass next_cursor to continue \
                  scanning.",
    params: &[
        ParamSpec::string(
            "query",
            "Search query to match against user names, display names, and real names",
        )
        .required(),
        ParamSpec::integer("limit", "Maximum number of users to return (default: 20)")
            .default_int(20)
            .range(1, SEARCH_PAGE_SIZE),
        CURSOR,
    ],
};

fn member_summary(user: &SlackUser) -> Value {
    let profile = user.profile.clone().unwrap_or_default();
    json!({
        "id": user.id,
        "name": user.name,
        "real_name": user.real_name(),
        "profile": {
            "display_name": profile.display_name,
            "email": profile.email,
            "image_48": profile.image_48,
        },
        "is_bot": user.is_bot,
        "deleted": user.deleted,
    })
}

fn matches_query(user: &SlackUser, query: &str) -> bool {
    [Some(user.name.as_str()), user.real_name(), user.display_name()]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(query))
}

impl SlackTool for GetUsersTool {
    fn spec(&self) -> &'static ToolSpec {
        &GET_USERS
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::UsersList)
                .param("limit", params.require_int("limit")?)
                .param_opt("cursor", params.str("cursor")),
        ))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let response: UsersListResponse =
            parse_payload(SlackMethod::UsersList.as_str(), payload.one()?)?;

        let members: Vec<Value> = response.members.iter().map(member_summary).collect();

        Ok(ToolResponse::data(json!({ "members": members }))
            .paginated(PageCursor::from_metadata(&response.response_metadata)))
    }
}

impl SlackTool for GetUserProfilesTool {
    fn spec(&self) -> &'static ToolSpec {
        &GET_USER_PROFILES
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        let calls = params
            .str_list("user_ids")
            .into_iter()
            .map(|id| {
                (
                    id.to_string(),
                    UpstreamCall::bot(SlackMethod::UsersProfileGet).param("user", id),
                )
            })
            .collect();
        Ok(Plan::EachOf(calls))
    }

    fn shape(&self, _params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let mut profiles = Vec::new();
        for (user_id, result) in payload.each()? {
            let entry = match result {
                Ok(value) => {
                    let response: UserProfileResponse =
                        parse_payload(SlackMethod::UsersProfileGet.as_str(), value)?;
                    json!({"user_id": user_id, "profile": response.profile})
                }
                Err(err) => json!({"user_id": user_id, "error": err.code()}),
            };
            profiles.push(entry);
        }

        Ok(ToolResponse::data(json!({ "profiles": profiles })))
    }
}

impl SlackTool for SearchUsersTool {
    fn spec(&self) -> &'static ToolSpec {
        &SEARCH_USERS
    }

    fn plan(&self, params: &Params) -> McpResult<Plan> {
        Ok(Plan::One(
            UpstreamCall::bot(SlackMethod::UsersList)
                .param("limit", SEARCH_PAGE_SIZE)
                .param_opt("cursor", params.str("cursor")),
        ))
    }

    fn shape(&self, params: &Params, payload: Payload) -> McpResult<ToolResponse> {
        let response: UsersListResponse =
            parse_payload(SlackMethod::UsersList.as_str(), payload.one()?)?;
        let query = params.require_str("query")?.trim().to_lowercase();
        let limit = params.require_int("limit")? as usize;

        let users: Vec<Value> = response
            .members
            .iter()
            .filter(|user| !user.deleted && matches_query(user, &query))
            .take(limit)
            .map(|user| {
                json!({
                    "id": user.id,
                    "name": user.name,
                    "real_name": user.real_name(),
                    "display_name": user.display_name(),
                    "email": user.email(),
                    "is_bot": user.is_bot,
                })
            })
            .collect();

        Ok(ToolResponse::data(json!({
            "total": users.len(),
            "users": users,
        }))
        .paginated(PageCursor::from_metadata(&response.response_metadata)))
    }
}
