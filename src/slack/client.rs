use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;

/// Slack Web API methods reachable through the tool surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlackMethod {
    ConversationsList,
    ConversationsHistory,
    ConversationsReplies,
    ChatPostMessage,
    ReactionsAdd,
    UsersList,
    UsersProfileGet,
    SearchMessages,
}

impl SlackMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlackMethod::ConversationsList => "conversations.list",
            SlackMethod::ConversationsHistory => "conversations.history",
            SlackMethod::ConversationsReplies => "conversations.replies",
            SlackMethod::ChatPostMessage => "chat.postMessage",
            SlackMethod::ReactionsAdd => "reactions.add",
            SlackMethod::UsersList => "users.list",
            SlackMethod::UsersProfileGet => "users.profile.get",
            SlackMethod::SearchMessages => "search.messages",
        }
    }
}

/// Which configured credential authenticates a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Bot,
    User,
}

/// One outbound Slack call, fully described before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamCall {
    pub method: SlackMethod,
    pub token: TokenKind,
    pub params: BTreeMap<&'static str, String>,
}

impl UpstreamCall {
    pub fn bot(method: SlackMethod) -> Self {
        Self {
            method,
            token: TokenKind::Bot,
            params: BTreeMap::new(),
        }
    }

    pub fn user(method: SlackMethod) -> Self {
        Self {
            method,
            token: TokenKind::User,
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.insert(name, value.to_string());
        self
    }

    pub fn param_opt(self, name: &'static str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }
}

/// Seam between the tool pipeline and the Slack Web API.
///
/// Implementations perform exactly one request per call and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn call(&self, call: &UpstreamCall) -> Result<Value, UpstreamError>;
}

pub struct SlackClient {
    http: reqwest::Client,
    base_url: String,
    bot_token: String,
    user_token: String,
}

impl SlackClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connection.timeout_seconds))
            .pool_max_idle_per_host(config.connection.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(
                config.connection.pool_idle_timeout_seconds,
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: config.slack.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.slack.bot_token.clone(),
            user_token: config.slack.user_token.clone(),
        })
    }

    fn token(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::Bot => &self.bot_token,
            TokenKind::User => &self.user_token,
        }
    }
}

#[async_trait]
impl SlackApi for SlackClient {
    async fn call(&self, call: &UpstreamCall) -> Result<Value, UpstreamError> {
        let method = call.method.as_str();
        let url = format!("{}/{}", self.base_url, method);
        debug!(method, "Calling Slack API");

        let response = self
            .http
            .post(url)
            .bearer_auth(self.token(call.token))
            .form(&call.params)
            .send()
            .await
            .map_err(|e| {
                warn!(method, error = %e.without_url(), "Slack request failed");
                UpstreamError::Other {
                    code: "transport_error".to_string(),
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(UpstreamError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(UpstreamError::Auth {
                code: format!("http_{}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(UpstreamError::Other {
                code: format!("http_{}", status.as_u16()),
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            warn!(method, error = %e.without_url(), "Slack response was not JSON");
            UpstreamError::Other {
                code: "invalid_response".to_string(),
            }
        })?;

        if body.get("ok").and_then(Value::as_bool) == Some(true) {
            Ok(body)
        } else {
            let code = body
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error");
            Err(UpstreamError::from_slack_code(code))
        }
    }
}
