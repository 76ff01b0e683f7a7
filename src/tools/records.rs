use serde::Serialize;
use serde_json::Value;

use crate::slack::types::{ResponseMetadata, SearchMatchChannel, SearchMatchPayload, SlackChannel};

/// Opaque pagination token, round-tripped verbatim between Slack responses
/// and follow-up requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    /// Slack signals the last page with an empty `next_cursor`.
    pub fn from_metadata(metadata: &ResponseMetadata) -> Option<Self> {
        metadata
            .next_cursor
            .as_deref()
            .filter(|cursor| !cursor.is_empty())
            .map(|cursor| PageCursor(cursor.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    PublicChannel,
    PrivateChannel,
    Dm,
    Mpdm,
}

impl ConversationKind {
    fn from_flags(is_private: bool, is_im: bool, is_mpim: bool) -> Self {
        if is_im {
            ConversationKind::Dm
        } else if is_mpim {
            ConversationKind::Mpdm
        } else if is_private {
            ConversationKind::PrivateChannel
        } else {
            ConversationKind::PublicChannel
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, ConversationKind::PublicChannel)
    }
}

/// Anything whose visibility is decided by the conversation it belongs to.
pub trait HasConversationKind {
    fn conversation_kind(&self) -> ConversationKind;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationRecord {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub kind: ConversationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_members: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl ConversationRecord {
    pub fn from_channel(channel: &SlackChannel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            kind: ConversationKind::from_flags(
                channel.is_private || channel.is_group,
                channel.is_im,
                channel.is_mpim,
            ),
            is_archived: Some(channel.is_archived),
            num_members: channel.num_members,
            purpose: None,
        }
    }

    pub fn with_purpose(mut self, channel: &SlackChannel) -> Self {
        self.purpose = channel
            .purpose
            .as_ref()
            .map(|p| p.value.clone())
            .filter(|v| !v.is_empty());
        self
    }

    fn from_search_channel(channel: &SearchMatchChannel) -> Self {
        Self {
            id: channel.id.clone(),
            name: channel.name.clone(),
            kind: ConversationKind::from_flags(channel.is_private, channel.is_im, channel.is_mpim),
            is_archived: None,
            num_members: None,
            purpose: None,
        }
    }
}

impl HasConversationKind for ConversationRecord {
    fn conversation_kind(&self) -> ConversationKind {
        self.kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMatch {
    #[serde(rename = "type")]
    pub match_type: Option<String>,
    pub user: Option<String>,
    pub username: Option<String>,
    pub text: String,
    pub ts: Option<String>,
    pub channel: ConversationRecord,
    pub permalink: Option<String>,
}

impl SearchMatch {
    /// A match without a channel is a contract violation; callers surface it
    /// as a mapping error.
    pub fn from_payload(payload: SearchMatchPayload) -> Option<Self> {
        let channel = ConversationRecord::from_search_channel(payload.channel.as_ref()?);
        Some(Self {
            match_type: payload.match_type,
            user: payload.user,
            username: payload.username,
            text: payload.text,
            ts: payload.ts,
            channel,
            permalink: payload.permalink,
        })
    }
}

impl HasConversationKind for SearchMatch {
    fn conversation_kind(&self) -> ConversationKind {
        self.channel.kind
    }
}

pub fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>, serde_json::Error> {
    records.iter().map(serde_json::to_value).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn channel(value: Value) -> SlackChannel {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_kind_from_channel_flags() {
        let cases = [
            (
                json!({"id": "C1", "name": "general", "is_channel": true}),
                ConversationKind::PublicChannel,
            ),
            (
                json!({"id": "G1", "name": "ops", "is_private": true}),
                ConversationKind::PrivateChannel,
            ),
            (
                json!({"id": "G2", "name": "old", "is_group": true}),
                ConversationKind::PrivateChannel,
            ),
            (json!({"id": "D1", "is_im": true}), ConversationKind::Dm),
            (
                json!({"id": "G3", "name": "mpdm-a--b", "is_mpim": true, "is_private": true}),
                ConversationKind::Mpdm,
            ),
        ];

        for (raw, expected) in cases {
            let record = ConversationRecord::from_channel(&channel(raw));
            assert_eq!(record.kind, expected, "{}", record.id);
        }
    }

    #[test]
    fn test_record_serializes_kind_tag() {
        let dm = ConversationRecord::from_channel(&channel(json!({"id": "D1", "is_im": true})));
        let value = serde_json::to_value(&dm).unwrap();

        assert_eq!(value["kind"], "dm");
        assert!(value.get("name").is_none());
    }

    #[test]
    fn test_empty_cursor_means_last_page() {
        let last = ResponseMetadata {
            next_cursor: Some(String::new()),
        };
        let more = ResponseMetadata {
            next_cursor: Some("dGVhbTpDMDYx".to_string()),
        };

        assert_eq!(PageCursor::from_metadata(&last), None);
        assert_eq!(PageCursor::from_metadata(&ResponseMetadata::default()), None);
        assert_eq!(
            PageCursor::from_metadata(&more).unwrap().as_str(),
            "dGVhbTpDMDYx"
        );
    }
}
