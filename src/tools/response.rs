use serde_json::{Value, json};

use super::records::{ConversationRecord, PageCursor, SearchMatch, to_values};
use crate::error::McpResult;
use crate::slack::types::SearchPaging;

/// Output of the shaping stage, before safe search has run.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub body: ResponseBody,

    /// Present only for paginated tools
    pub metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Tool output with no conversation records in it.
    Data(Value),

    /// A collection of conversations rendered under `field`.
    Conversations {
        field: &'static str,
        records: Vec<ConversationRecord>,
        with_total: bool,
    },

    /// `search.messages` matches; `total` is the upstream count.
    SearchMatches {
        total: u64,
        matches: Vec<SearchMatch>,
        paging: Option<SearchPaging>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseMetadata {
    /// Indicates if there's more data available (for pagination)
    pub has_more: bool,

    /// Cursor for pagination
    pub next_cursor: Option<PageCursor>,
}

impl ToolResponse {
    /// Create a simple response with just data
    pub fn data(data: Value) -> Self {
        Self {
            body: ResponseBody::Data(data),
            metadata: None,
        }
    }

    pub fn conversations(field: &'static str, records: Vec<ConversationRecord>) -> Self {
        Self {
            body: ResponseBody::Conversations {
                field,
                records,
                with_total: false,
            },
            metadata: None,
        }
    }

    pub fn search_matches(
        total: u64,
        matches: Vec<SearchMatch>,
        paging: Option<SearchPaging>,
    ) -> Self {
        Self {
            body: ResponseBody::SearchMatches {
                total,
                matches,
                paging,
            },
            metadata: None,
        }
    }

    /// Emit `total` computed from the records that reach the caller.
    pub fn with_total(mut self) -> Self {
        if let ResponseBody::Conversations { with_total, .. } = &mut self.body {
            *with_total = true;
        }
        self
    }

    /// Attach pagination; `has_more` follows the presence of a cursor so a
    /// missing cursor always means the last page.
    pub fn paginated(mut self, next_cursor: Option<PageCursor>) -> Self {
        self.metadata = Some(ResponseMetadata {
            has_more: next_cursor.is_some(),
            next_cursor,
        });
        self
    }

    /// Convert to JSON Value for MCP protocol
    pub(crate) fn into_json(self) -> McpResult<Value> {
        let mut result = match self.body {
            ResponseBody::Data(data) => data,
            ResponseBody::Conversations {
                field,
                records,
                with_total,
            } => {
                let mut result = json!({ field: to_values(&records)? });
                if with_total {
                    result["total"] = json!(records.len());
                }
                result
            }
            ResponseBody::SearchMatches {
                total,
                matches,
                paging,
            } => {
                let mut result = json!({
                    "messages": {
                        "total": total,
                        "matches": to_values(&matches)?,
                    }
                });
                if let Some(paging) = paging {
                    result["paging"] = serde_json::to_value(paging)?;
                    if paging.page < paging.pages {
                        result["next_page"] = json!(paging.page + 1);
                    }
                }
                result
            }
        };

        if let Some(metadata) = self.metadata {
            result["has_more"] = metadata.has_more.into();
            if let Some(cursor) = metadata.next_cursor {
                result["next_cursor"] = cursor.into_string().into();
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::types::ResponseMetadata as SlackMetadata;
    use pretty_assertions::assert_eq;

    fn cursor(value: &str) -> Option<PageCursor> {
        PageCursor::from_metadata(&SlackMetadata {
            next_cursor: Some(value.to_string()),
        })
    }

    #[test]
    fn test_tool_response_data_only() {
        let data = json!({"key": "value", "count": 42});
        let result = ToolResponse::data(data).into_json().unwrap();

        assert_eq!(result["key"], "value");
        assert_eq!(result["count"], 42);
        assert!(result.get("has_more").is_none());
    }

    #[test]
    fn test_tool_response_paginated_with_cursor() {
        let data = json!({"items": [1, 2, 3]});
        let result = ToolResponse::data(data)
            .paginated(cursor("next_page_token"))
            .into_json()
            .unwrap();

        assert_eq!(result["items"], json!([1, 2, 3]));
        assert_eq!(result["has_more"], json!(true));
        assert_eq!(result["next_cursor"], "next_page_token");
    }

    #[test]
    fn test_tool_response_paginated_without_cursor() {
        let data = json!({"items": [1, 2, 3]});
        let result = ToolResponse::data(data)
            .paginated(cursor(""))
            .into_json()
            .unwrap();

        assert_eq!(result["has_more"], json!(false));
        assert!(result.get("next_cursor").is_none());
    }

    #[test]
    fn test_conversations_render_under_field_with_total() {
        let record = ConversationRecord {
            id: "C1".to_string(),
            name: Some("general".to_string()),
            kind: crate::tools::records::ConversationKind::PublicChannel,
            is_archived: Some(false),
            num_members: Some(12),
            purpose: None,
        };
        let result = ToolResponse::conversations("channels", vec![record])
            .with_total()
            .into_json()
            .unwrap();

        assert_eq!(result["channels"][0]["id"], "C1");
        assert_eq!(result["channels"][0]["kind"], "public_channel");
        assert_eq!(result["total"], 1);
    }

    #[test]
    fn test_search_matches_expose_next_page() {
        let paging = SearchPaging {
            count: 20,
            total: 45,
            page: 1,
            pages: 3,
        };
        let result = ToolResponse::search_matches(45, vec![], Some(paging))
            .into_json()
            .unwrap();

        assert_eq!(result["messages"]["total"], 45);
        assert_eq!(result["paging"]["pages"], 3);
        assert_eq!(result["next_page"], 2);
    }

    #[test]
    fn test_search_matches_last_page_has_no_next_page() {
        let paging = SearchPaging {
            count: 20,
            total: 5,
            page: 1,
            pages: 1,
        };
        let result = ToolResponse::search_matches(5, vec![], Some(paging))
            .into_json()
            .unwrap();

        assert!(result.get("next_page").is_none());
    }

    #[test]
    fn test_tool_response_array_data() {
        let result = ToolResponse::data(json!([1, 2, 3, 4, 5])).into_json().unwrap();
        assert_eq!(result, json!([1, 2, 3, 4, 5]));
    }
}
