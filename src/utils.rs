use crate::error::{McpError, McpResult};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Decode an upstream payload into the shape a tool expects.
///
/// Failure here means Slack answered `ok: true` with a body we cannot read,
/// which is a mapping error rather than anything the caller did.
pub fn parse_payload<T: DeserializeOwned>(method: &str, payload: Value) -> McpResult<T> {
    serde_json::from_value(payload)
        .map_err(|e| McpError::Mapping(format!("{} response: {}", method, e)))
}

/// Slack IDs for public channels and private groups; anything else is a name.
pub fn looks_like_channel_id(identifier: &str) -> bool {
    looks_like_slack_id(identifier, &['C', 'G', 'D'])
}

pub fn looks_like_user_id(identifier: &str) -> bool {
    looks_like_slack_id(identifier, &['U', 'W'])
}

fn looks_like_slack_id(identifier: &str, prefixes: &[char]) -> bool {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) if prefixes.contains(&first) => {
            let rest = chars.as_str();
            rest.len() >= 2
                && rest
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        }
        _ => false,
    }
}

/// Emoji names are accepted with or without surrounding colons.
pub fn normalize_reaction(name: &str) -> &str {
    name.trim().trim_matches(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Channels {
        #[allow(dead_code)]
        channels: Vec<String>,
    }

    #[test]
    fn test_parse_payload_maps_shape_errors() {
        let ok: McpResult<Channels> =
            parse_payload("conversations.list", json!({"channels": ["C1"]}));
        assert!(ok.is_ok());

        let err = parse_payload::<Channels>("conversations.list", json!({"channels": 3}))
            .unwrap_err();
        assert!(matches!(err, McpError::Mapping(_)));
    }

    #[test]
    fn test_slack_id_detection() {
        assert!(looks_like_channel_id("C024BE91L"));
        assert!(looks_like_channel_id("G0123ABCD"));
        assert!(!looks_like_channel_id("general"));
        assert!(!looks_like_channel_id("Company-news"));
        assert!(looks_like_user_id("U024BE7LH"));
        assert!(looks_like_user_id("W012A3CDE"));
        assert!(!looks_like_user_id("alice"));
    }

    #[test]
    fn test_normalize_reaction() {
        assert_eq!(normalize_reaction(":thumbsup:"), "thumbsup");
        assert_eq!(normalize_reaction("eyes"), "eyes");
    }
}
