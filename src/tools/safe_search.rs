//! Safe-search filter stage.
//!
//! When enabled, every conversation record that is not a public channel is
//! removed from tool output, along with search matches posted in such
//! conversations. Filtering is page-local: the upstream cursor is passed
//! through untouched, so a page may hold fewer records than requested and
//! still be followed by more pages.

use serde_json::Value;
use tracing::info;

use super::records::HasConversationKind;
use super::response::{ResponseBody, ToolResponse};
use crate::error::McpResult;

/// Process-wide switch, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SafeSearchPolicy {
    enabled: bool,
}

impl SafeSearchPolicy {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Run the filter stage over a shaped response.
    pub fn apply(&self, tool: &str, mut response: ToolResponse) -> Filtered {
        if !self.enabled {
            return Filtered(response);
        }

        let removed = match &mut response.body {
            ResponseBody::Data(_) => 0,
            ResponseBody::Conversations { records, .. } => retain_public(records),
            ResponseBody::SearchMatches { matches, .. } => retain_public(matches),
        };
        if removed > 0 {
            info!(
                tool,
                removed, "Safe search: filtered out records from private channels/DMs"
            );
        }

        Filtered(response)
    }
}

/// Pure removal; survivors keep their relative order.
fn retain_public<T: HasConversationKind>(records: &mut Vec<T>) -> usize {
    let before = records.len();
    records.retain(|record| record.conversation_kind().is_public());
    before - records.len()
}

/// A response that has passed the filter stage. Only this type can be
/// rendered for the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Filtered(ToolResponse);

impl Filtered {
    pub fn response(&self) -> &ToolResponse {
        &self.0
    }

    pub fn into_json(self) -> McpResult<Value> {
        self.0.into_json()
    }
}
