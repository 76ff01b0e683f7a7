use crate::slack::types::SlackMessage;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};

/// Convert Slack timestamp to ISO 8601 format
/// Slack timestamps are Unix timestamps with microseconds (e.g., "1234567890.123456")
pub fn slack_ts_to_iso8601(ts: &str) -> Option<String> {
    let (secs, micros) = ts.split_once('.').unwrap_or((ts, "0"));
    let seconds = secs.parse::<i64>().ok()?;
    let micros = format!("{:0<6}", micros).get(..6)?.parse::<u32>().ok()?;

    Utc.timestamp_opt(seconds, micros * 1_000)
        .single()
        .map(|dt: DateTime<Utc>| dt.to_rfc3339())
}

/// Format a message for history and thread output.
///
/// Optional fields are omitted rather than emitted as null.
pub fn format_message(msg: &SlackMessage) -> Value {
    let mut result = json!({
        "ts": msg.ts,
        "text": msg.text,
    });

    if let Some(message_type) = &msg.message_type {
        result["type"] = json!(message_type);
    }

    if let Some(iso_time) = slack_ts_to_iso8601(&msg.ts) {
        result["datetime"] = json!(iso_time);
    }

    if let Some(user) = &msg.user {
        result["user"] = json!(user);
    }

    if let Some(thread_ts) = &msg.thread_ts {
        result["thread_ts"] = json!(thread_ts);

        // Check if this is a thread parent or reply
        if thread_ts == &msg.ts {
            result["is_thread_parent"] = json!(true);
        } else {
            result["is_thread_reply"] = json!(true);
        }
    }

    if let Some(reply_count) = msg.reply_count
        && reply_count > 0
    {
        result["reply_count"] = json!(reply_count);
    }

    if let Some(reactions) = &msg.reactions
        && !reactions.is_empty()
    {
        result["reactions"] = json!(
            reactions
                .iter()
                .map(|r| json!({"name": r.name, "count": r.count, "users": r.users}))
                .collect::<Vec<_>>()
        );
    }

    result
}
