use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackUserProfile {
    pub real_name: Option<String>,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub image_48: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub real_name: Option<String>,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub deleted: bool,
    pub profile: Option<SlackUserProfile>,
}

impl SlackUser {
    // Top-level real_name is not always populated; fall back to the profile
    pub fn real_name(&self) -> Option<&str> {
        self.real_name
            .as_deref()
            .or_else(|| self.profile.as_ref()?.real_name.as_deref())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.profile.as_ref()?.display_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.profile.as_ref()?.email.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackChannel {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_channel: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
    pub num_members: Option<i64>,
    pub purpose: Option<ChannelPurpose>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPurpose {
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackMessage {
    #[serde(rename = "type")]
    pub message_type: Option<String>,
    pub ts: String,
    pub user: Option<String>,
    #[serde(default)]
    pub text: String,
    pub thread_ts: Option<String>,
    pub reply_count: Option<i64>,
    pub reactions: Option<Vec<Reaction>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsListResponse {
    #[serde(default)]
    pub channels: Vec<SlackChannel>,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationsHistoryResponse {
    #[serde(default)]
    pub messages: Vec<SlackMessage>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersListResponse {
    #[serde(default)]
    pub members: Vec<SlackUser>,
    #[serde(default)]
    pub response_metadata: ResponseMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfileResponse {
    #[serde(default)]
    pub profile: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostMessageResponse {
    pub channel: Option<String>,
    pub ts: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMessagesResponse {
    pub messages: SearchMessages,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMessages {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matches: Vec<SearchMatchPayload>,
    pub paging: Option<SearchPaging>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchMatchPayload {
    #[serde(rename = "type")]
    pub match_type: Option<String>,
    pub user: Option<String>,
    pub username: Option<String>,
    #[serde(default)]
    pub text: String,
    pub ts: Option<String>,
    pub channel: Option<SearchMatchChannel>,
    pub permalink: Option<String>,
}

/// Channel summary embedded in each `search.messages` match.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchMatchChannel {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_im: bool,
    #[serde(default)]
    pub is_mpim: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchPaging {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub pages: u64,
}
