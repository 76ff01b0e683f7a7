use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum McpError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The upstream payload did not match the shape the tool declares.
    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for McpError {
    fn from(err: anyhow::Error) -> Self {
        McpError::Internal(err.to_string())
    }
}

pub type McpResult<T> = std::result::Result<T, McpError>;

impl McpError {
    /// Structured failure object returned to the caller in place of a result.
    /// Mapping and internal errors never expose their detail.
    pub fn to_failure(&self) -> Value {
        match self {
            McpError::Validation(err) => json!({
                "error": {
                    "type": "validation",
                    "field": err.field,
                    "reason": err.reason.code(),
                    "message": err.to_string(),
                }
            }),
            McpError::Upstream(err) => {
                let mut body = json!({
                    "type": "upstream",
                    "classification": err.classification(),
                    "code": err.code(),
                    "message": err.to_string(),
                });
                if let UpstreamError::RateLimited {
                    retry_after_secs: Some(secs),
                } = err
                {
                    body["retry_after_secs"] = json!(secs);
                }
                json!({ "error": body })
            }
            McpError::NotFound(what) => json!({
                "error": {
                    "type": "not_found",
                    "message": what,
                }
            }),
            McpError::Mapping(_) | McpError::Serialization(_) | McpError::Internal(_) => json!({
                "error": {
                    "type": "internal",
                    "message": "internal error",
                }
            }),
        }
    }
}

/// Why a caller-supplied parameter was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    Missing,
    Unknown,
    WrongType { expected: &'static str },
    OutOfRange { detail: String },
    InvalidFormat { expected: &'static str },
}

impl ValidationReason {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationReason::Missing => "missing",
            ValidationReason::Unknown => "unknown",
            ValidationReason::WrongType { .. } => "wrong_type",
            ValidationReason::OutOfRange { .. } => "out_of_range",
            ValidationReason::InvalidFormat { .. } => "invalid_format",
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationReason::Missing => write!(f, "required parameter is missing"),
            ValidationReason::Unknown => write!(f, "parameter is not accepted by this tool"),
            ValidationReason::WrongType { expected } => write!(f, "expected {}", expected),
            ValidationReason::OutOfRange { detail } => write!(f, "out of range: {}", detail),
            ValidationReason::InvalidFormat { expected } => {
                write!(f, "invalid format, expected {}", expected)
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid parameter '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }

    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::Missing)
    }

    pub fn unknown(field: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::Unknown)
    }

    pub fn wrong_type(field: impl Into<String>, expected: &'static str) -> Self {
        Self::new(field, ValidationReason::WrongType { expected })
    }

    pub fn out_of_range(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(
            field,
            ValidationReason::OutOfRange {
                detail: detail.into(),
            },
        )
    }

    pub fn invalid_format(field: impl Into<String>, expected: &'static str) -> Self {
        Self::new(field, ValidationReason::InvalidFormat { expected })
    }
}

/// Slack error codes that mean the credential itself was refused.
const AUTH_ERROR_CODES: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
    "no_permission",
    "missing_scope",
    "not_allowed_token_type",
    "ekm_access_denied",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    #[error("Slack authentication failed ({code})")]
    Auth { code: String },

    #[error("Slack rate limit reached")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Slack API error ({code})")]
    Other { code: String },
}

impl UpstreamError {
    /// Classify the `error` field of a Slack response with `ok: false`.
    pub fn from_slack_code(code: &str) -> Self {
        if code == "ratelimited" || code == "rate_limited" {
            UpstreamError::RateLimited {
                retry_after_secs: None,
            }
        } else if AUTH_ERROR_CODES.contains(&code) {
            UpstreamError::Auth {
                code: code.to_string(),
            }
        } else {
            UpstreamError::Other {
                code: code.to_string(),
            }
        }
    }

    /// Slack-style error code, safe to echo back to the caller.
    pub fn code(&self) -> &str {
        match self {
            UpstreamError::Auth { code } | UpstreamError::Other { code } => code,
            UpstreamError::RateLimited { .. } => "ratelimited",
        }
    }

    pub fn classification(&self) -> &'static str {
        match self {
            UpstreamError::Auth { .. } => "auth",
            UpstreamError::RateLimited { .. } => "rate_limited",
            UpstreamError::Other { .. } => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slack_codes_are_classified() {
        assert_eq!(
            UpstreamError::from_slack_code("invalid_auth").classification(),
            "auth"
        );
        assert_eq!(
            UpstreamError::from_slack_code("missing_scope").classification(),
            "auth"
        );
        assert_eq!(
            UpstreamError::from_slack_code("ratelimited").classification(),
            "rate_limited"
        );
        assert_eq!(
            UpstreamError::from_slack_code("channel_not_found"),
            UpstreamError::Other {
                code: "channel_not_found".to_string()
            }
        );
    }

    #[test]
    fn test_validation_failure_names_field() {
        let err: McpError = ValidationError::missing("channel_id").into();
        let failure = err.to_failure();

        assert_eq!(failure["error"]["type"], "validation");
        assert_eq!(failure["error"]["field"], "channel_id");
        assert_eq!(failure["error"]["reason"], "missing");
    }

    #[test]
    fn test_rate_limit_failure_carries_retry_after() {
        let err: McpError = UpstreamError::RateLimited {
            retry_after_secs: Some(30),
        }
        .into();
        let failure = err.to_failure();

        assert_eq!(failure["error"]["classification"], "rate_limited");
        assert_eq!(failure["error"]["retry_after_secs"], 30);
    }

    #[test]
    fn test_mapping_failure_is_opaque() {
        let err = McpError::Mapping("missing field `channels`".to_string());
        let failure = err.to_failure();

        assert_eq!(failure["error"]["type"], "internal");
        assert_eq!(failure["error"]["message"], "internal error");
    }
}
